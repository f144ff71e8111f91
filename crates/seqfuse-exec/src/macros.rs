/// Run a source through a chain of stages: `pipe!(source, s1, s2, ..)`.
///
/// Shorthand for `seqfuse_exec::run(source, &[s1, s2, ..])`; the source is
/// anything convertible into a `Value`.
#[macro_export]
macro_rules! pipe {
    ($source:expr $(, $stage:expr)+ $(,)?) => {
        $crate::run($source, &[$($stage),+])
    };
}

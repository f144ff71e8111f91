//! Fused execution must agree with applying every stage on its own.

use seqfuse_core::config::EngineConfig;
use seqfuse_core::value::Value;
use seqfuse_exec::{pipe, run, Engine, ExecError};
use seqfuse_operators::{
    chunk, compact, difference, difference_with, eager, filter, filter_indexed, find,
    find_index, first, flat_map, flatten, flatten_deep, group_by, intersection,
    intersection_by, map, map_indexed, pluck, reject, reverse, skip, skip_while, sort_by,
    take, take_while, uniq, uniq_by, uniq_with, Stage,
};

fn ints(v: &[i64]) -> Value {
    Value::list(v.to_vec())
}

fn num(v: &Value) -> i64 {
    v.as_i64().unwrap_or(0)
}

fn outcome(r: Result<Value, ExecError>) -> Result<Value, String> {
    r.map_err(|e| e.to_string())
}

/// Run `build()` fused and sequentially over `src`; both must agree.
fn assert_equivalent(src: Value, build: impl Fn() -> Vec<Stage>) -> Result<Value, String> {
    let fused = outcome(Engine::default().run(src.clone(), &build()));
    let sequential = outcome(Engine::new(EngineConfig::sequential()).run(src, &build()));
    assert_eq!(fused, sequential);
    fused
}

#[test]
fn lazy_chain_matches_sequential() {
    let out = assert_equivalent(ints(&[5, 3, 8, 3, 1, 9, 2, 8, 7]), || {
        vec![
            map(|v| Value::Int(num(v) + 1)),
            filter(|v| num(v) % 2 == 0),
            uniq(),
            skip(1),
            take(2),
        ]
    });
    assert_eq!(out, Ok(ints(&[4, 2])));
}

#[test]
fn eager_stages_split_runs() {
    let out = assert_equivalent(ints(&[4, 1, 3, 1, 2, 5]), || {
        vec![
            uniq(),
            sort_by(|v| v.clone()),
            map(|v| Value::Int(num(v) * 10)),
            reverse(),
            take(3),
            chunk(2).unwrap(),
        ]
    });
    assert_eq!(
        out,
        Ok(Value::list(vec![ints(&[50, 40]), ints(&[30])]))
    );
}

#[test]
fn set_operations_match_sequential() {
    let src = ints(&[1, 2, 2, 3, 3, 3, 4]);
    assert_equivalent(src.clone(), || vec![difference(vec![2, 3, 3]), take(3)]);
    assert_equivalent(src.clone(), || vec![intersection(vec![3, 2, 3, 9]), map(|v| v.clone())]);
    assert_equivalent(src.clone(), || {
        vec![difference_with(vec![0], |a: &Value, b: &Value| num(a) % 2 == num(b) % 2)]
    });
    let rows = Value::list(vec![
        Value::record([("id", 1)]),
        Value::record([("id", 2)]),
        Value::record([("id", 2)]),
    ]);
    let out = assert_equivalent(rows, || {
        vec![
            intersection_by(vec![Value::record([("id", 2)])], |v| {
                v.get("id").cloned().unwrap_or_default()
            }),
            pluck("id").unwrap(),
        ]
    });
    assert_eq!(out, Ok(ints(&[2])));
}

#[test]
fn expansion_and_truncation_mix() {
    let nested = Value::list(vec![
        ints(&[1, 2]),
        Value::list(vec![ints(&[3]), Value::Int(4)]),
        Value::Int(5),
        ints(&[6, 7, 8]),
    ]);
    assert_equivalent(nested.clone(), || vec![flatten(), take(4)]);
    assert_equivalent(nested.clone(), || {
        vec![
            flatten_deep(),
            skip_while(|v| num(v) < 3),
            take_while(|v| num(v) < 7),
        ]
    });
    let out = assert_equivalent(ints(&[1, 2, 3]), || {
        vec![
            flat_map(|v| Value::list(vec![num(v), -num(v)])),
            reject(|v| num(v) == -2),
            take(4),
        ]
    });
    assert_eq!(out, Ok(ints(&[1, -1, 2, 3])));
}

#[test]
fn indexed_callbacks_see_the_same_positions() {
    let out = assert_equivalent(ints(&[10, 11, 12, 13, 14, 15]), || {
        vec![
            filter(|v| num(v) != 12),
            filter_indexed(|_, i, _| i % 2 == 0),
            map_indexed(|v, i, seen| {
                Value::list(vec![v.clone(), Value::from(i), Value::from(seen.len())])
            }),
        ]
    });
    assert_eq!(
        out,
        Ok(Value::list(vec![
            ints(&[10, 0, 1]),
            ints(&[13, 1, 2]),
            ints(&[15, 2, 3]),
        ]))
    );
}

#[test]
fn single_stage_mid_chain() {
    // a list found by `find` is iterated by the next run
    let groups = Value::list(vec![ints(&[1]), ints(&[2, 3, 4]), ints(&[5, 6])]);
    let out = assert_equivalent(groups.clone(), || {
        vec![
            find(|v| v.as_list().map_or(false, |l| l.len() > 1)),
            map(|v| Value::Int(num(v) * 2)),
            take(2),
        ]
    });
    assert_eq!(out, Ok(ints(&[4, 6])));

    // a scalar result cannot feed a sequence stage in either mode
    let out = assert_equivalent(ints(&[1, 2]), || vec![first(), map(|v| v.clone())]);
    assert_eq!(out, Err("Stage 'map' expects a sequence, got int".to_string()));

    let out = assert_equivalent(ints(&[4, 7, 9]), || {
        vec![filter(|v| num(v) > 4), find_index(|v| num(v) == 9)]
    });
    assert_eq!(out, Ok(Value::Int(1)));
}

#[test]
fn non_list_source_falls_back_to_eager() {
    let out = assert_equivalent(Value::Int(3), || {
        vec![
            eager("range", |v| Ok(Value::list((0..v.as_i64().unwrap_or(0)).collect::<Vec<_>>()))),
            map(|v| Value::Int(num(v) + 1)),
        ]
    });
    assert_eq!(out, Ok(ints(&[1, 2, 3])));

    let out = assert_equivalent(Value::from("text"), || vec![uniq()]);
    assert!(out.is_err());
}

#[test]
fn empty_source() {
    let out = assert_equivalent(ints(&[]), || vec![map(|v| v.clone()), uniq()]);
    assert_eq!(out, Ok(ints(&[])));
    let out = assert_equivalent(ints(&[]), || vec![compact(), first()]);
    assert_eq!(out, Ok(Value::Null));
}

#[test]
fn dedupe_is_idempotent() {
    let src = Value::list(vec![
        Value::Int(3),
        Value::Float(f64::NAN),
        Value::Int(3),
        Value::Float(f64::NAN),
        Value::Float(0.0),
        Value::Float(-0.0),
        Value::Float(3.0),
    ]);
    let once = run(src.clone(), &[uniq()]).unwrap();
    let twice = run(once.clone(), &[uniq()]).unwrap();
    assert_eq!(once, twice);
    // same-value-zero: NaN dedupes, 0.0 == -0.0, 3 != 3.0
    assert_eq!(once.as_list().map(|l| l.len()), Some(4));

    let by_parity = || uniq_by(|v| Value::Int(num(v) % 2));
    let once = run(ints(&[1, 2, 3, 4]), &[by_parity()]).unwrap();
    assert_eq!(run(once.clone(), &[by_parity()]).unwrap(), once);

    let close = || uniq_with(|a: &Value, b: &Value| (num(a) - num(b)).abs() <= 1);
    let once = run(ints(&[1, 2, 5, 6, 9]), &[close()]).unwrap();
    assert_eq!(run(once.clone(), &[close()]).unwrap(), once);
}

#[test]
fn group_by_after_fused_run() {
    let rows = Value::list(vec![
        Value::record([("team", "x"), ("name", "a")]),
        Value::record([("team", "y"), ("name", "b")]),
        Value::record([("team", "x"), ("name", "c")]),
    ]);
    let out = assert_equivalent(rows, || {
        vec![
            filter(|v| v.get("name").and_then(Value::as_str) != Some("b")),
            group_by(|v| v.get("team").cloned().unwrap_or_default()),
        ]
    })
    .unwrap();
    assert_eq!(out.get("x").and_then(Value::as_list).map(|l| l.len()), Some(2));
    assert!(out.get("y").is_none());
}

#[test]
fn pipe_macro_matches_run() {
    let a = pipe!(vec![1, 2, 2, 5, 1, 6, 7], uniq(), take(3)).unwrap();
    let b = run(vec![1, 2, 2, 5, 1, 6, 7], &[uniq(), take(3)]).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, ints(&[1, 2, 5]));
}

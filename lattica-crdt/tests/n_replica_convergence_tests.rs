//! N-replica convergence tests.
//!
//! These tests simulate realistic multi-replica topologies:
//! 1. Gossip-based selective sync (rotating pairs, not full mesh)
//! 2. Chain/transitive convergence (A→B→C achieves global convergence)
//! 3. Duplicated and reordered delivery
//! 4. Add/remove churn on the OR-map

use lattica_crdt::{LWWMap, Lattice, ORMap, PNCounter, ReplicaId};

fn replica(n: usize) -> ReplicaId {
    ReplicaId::from(format!("replica-{n:02}"))
}

/// Gossip: each round, replica i merges the snapshot of replica (i + round) % n.
fn gossip<T: Lattice>(replicas: &mut [T], rounds: usize) {
    let n = replicas.len();
    for round in 1..=rounds {
        let snapshots: Vec<T> = replicas.to_vec();
        for (i, r) in replicas.iter_mut().enumerate() {
            r.merge(&snapshots[(i + round) % n]);
        }
    }
}

fn assert_all_equal<T: PartialEq + std::fmt::Debug>(replicas: &[T]) {
    for (i, r) in replicas.iter().enumerate().skip(1) {
        assert_eq!(r, &replicas[0], "replica {i} diverged");
    }
}

#[test]
fn gossip_convergence_pn_counter_10_replicas() {
    let n = 10;
    let mut counters: Vec<PNCounter> = (0..n).map(|i| PNCounter::new(replica(i))).collect();
    for (i, c) in counters.iter_mut().enumerate() {
        c.increment(i as i64 * 10).unwrap();
        c.decrement(i as i64).unwrap();
    }

    gossip(&mut counters, n);
    assert_all_equal(&counters);
    // sum(10i) - sum(i) for i in 0..10
    assert_eq!(counters[0].value(), 450 - 45);
}

#[test]
fn chain_convergence_lww_map() {
    let mut maps: Vec<LWWMap<String, usize>> = (0..5).map(|i| LWWMap::new(replica(i))).collect();
    for (i, m) in maps.iter_mut().enumerate() {
        m.set(format!("k{i}"), i);
        m.set("shared".to_string(), i);
    }

    // Forward pass then backward pass along the chain
    for i in 1..maps.len() {
        let prev = maps[i - 1].clone();
        maps[i].merge(&prev);
    }
    for i in (0..maps.len() - 1).rev() {
        let next = maps[i + 1].clone();
        maps[i].merge(&next);
    }

    assert_all_equal(&maps);
    assert_eq!(maps[0].len(), 6);
}

#[test]
fn duplicated_and_reordered_delivery_is_harmless() {
    let mut a: ORMap<String, i32> = ORMap::new(replica(1));
    let mut b: ORMap<String, i32> = ORMap::new(replica(2));

    let mut history = Vec::new();
    for i in 0..5 {
        a.add(format!("k{}", i % 2), i);
        history.push(a.clone());
        if i % 2 == 0 {
            a.remove("k0");
            history.push(a.clone());
        }
    }

    // Deliver every snapshot twice, newest first
    for snapshot in history.iter().rev().chain(history.iter()) {
        b.merge(snapshot);
    }
    assert_eq!(b, a);
    assert_eq!(b.get("k0"), a.get("k0"));
    assert_eq!(b.get("k1"), a.get("k1"));
}

#[test]
fn or_map_churn_converges() {
    let n = 4;
    let mut maps: Vec<ORMap<String, usize>> = (0..n).map(|i| ORMap::new(replica(i))).collect();

    for step in 0..200 {
        let i = step % n;
        let key = format!("k{}", step % 3);
        if step % 5 == 0 {
            maps[i].remove(key.as_str());
        } else {
            maps[i].add(key, step);
        }
        if step % 7 == 0 {
            gossip(&mut maps, 1);
        }
    }

    gossip(&mut maps, n);
    assert_all_equal(&maps);
    for key in ["k0", "k1", "k2"] {
        let live = maps[0].contains_key(key);
        assert!(maps.iter().all(|m| m.contains_key(key) == live));
    }
}

//! Iterative dominator-tree construction (Cooper, Harvey & Kennedy's "A
//! Simple, Fast Dominance Algorithm") and its dual, used both for SSA
//! dominance checking (§4.4.2) and resume-label postdominance (§4.4.4).
//!
//! Unreachable blocks are left with `idom == None`; callers that only care
//! about reachable code (e.g. SSA dominance, which is only meaningful along
//! executable paths) treat `None` as "does not dominate anything".

pub fn compute_dominators(n: usize, entry: usize, preds: &[Vec<usize>], succs: &[Vec<usize>]) -> Vec<Option<usize>> {
    let mut visited = vec![false; n];
    let mut postorder = Vec::with_capacity(n);

    struct Frame {
        node: usize,
        next_child: usize,
    }
    let mut frames = vec![Frame { node: entry, next_child: 0 }];
    visited[entry] = true;
    while let Some(top) = frames.last_mut() {
        if top.next_child < succs[top.node].len() {
            let child = succs[top.node][top.next_child];
            top.next_child += 1;
            if !visited[child] {
                visited[child] = true;
                frames.push(Frame { node: child, next_child: 0 });
            }
        } else {
            postorder.push(top.node);
            frames.pop();
        }
    }

    let mut postorder_num = vec![usize::MAX; n];
    for (i, &node) in postorder.iter().enumerate() {
        postorder_num[node] = i;
    }
    let rpo: Vec<usize> = postorder.iter().rev().copied().collect();

    let mut idom: Vec<Option<usize>> = vec![None; n];
    idom[entry] = Some(entry);

    fn intersect(mut a: usize, mut b: usize, idom: &[Option<usize>], postorder_num: &[usize]) -> usize {
        while a != b {
            while postorder_num[a] < postorder_num[b] {
                a = idom[a].expect("finger walked past root during intersect");
            }
            while postorder_num[b] < postorder_num[a] {
                b = idom[b].expect("finger walked past root during intersect");
            }
        }
        a
    }

    let mut changed = true;
    while changed {
        changed = false;
        for &node in &rpo {
            if node == entry || !visited[node] {
                continue;
            }
            let mut new_idom: Option<usize> = None;
            for &p in &preds[node] {
                if !visited[p] || idom[p].is_none() {
                    continue;
                }
                new_idom = Some(match new_idom {
                    None => p,
                    Some(curr) => intersect(curr, p, &idom, &postorder_num),
                });
            }
            if new_idom != idom[node] {
                idom[node] = new_idom;
                changed = true;
            }
        }
    }
    idom
}

/// Whether `a` dominates `b` in the tree described by `idom` (as returned by
/// [`compute_dominators`], rooted at whatever entry produced it).
pub fn dominates(idom: &[Option<usize>], a: usize, b: usize) -> bool {
    if a == b {
        return true;
    }
    let mut cur = b;
    loop {
        let parent = match idom[cur] {
            Some(p) => p,
            None => return false,
        };
        if parent == cur {
            return false;
        }
        if parent == a {
            return true;
        }
        cur = parent;
    }
}

/// Postdominator tree: dominance over the reverse graph rooted at a
/// synthetic virtual exit node (index `n`) with an edge from every real exit
/// block. `a` postdominates `b` iff `a` dominates `b` in this tree.
pub fn compute_postdominators(n: usize, preds: &[Vec<usize>], succs: &[Vec<usize>], exits: &[usize]) -> Vec<Option<usize>> {
    let virtual_exit = n;
    let mut pd_preds: Vec<Vec<usize>> = vec![Vec::new(); n + 1];
    let mut pd_succs: Vec<Vec<usize>> = vec![Vec::new(); n + 1];
    for b in 0..n {
        pd_preds[b] = succs[b].clone();
        pd_succs[b] = preds[b].clone();
    }
    for &e in exits {
        pd_preds[e].push(virtual_exit);
        pd_succs[virtual_exit].push(e);
    }
    compute_dominators(n + 1, virtual_exit, &pd_preds, &pd_succs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diamond_cfg_dominance() {
        // entry -> {left, right} -> join
        let preds = vec![vec![], vec![0], vec![0], vec![1, 2]];
        let succs = vec![vec![1, 2], vec![3], vec![3], vec![]];
        let idom = compute_dominators(4, 0, &preds, &succs);
        assert_eq!(idom[3], Some(0));
        assert!(dominates(&idom, 0, 3));
        assert!(!dominates(&idom, 1, 3));
    }

    #[test]
    fn linear_chain_postdominance() {
        // entry -> a -> exit
        let preds = vec![vec![], vec![0], vec![1]];
        let succs = vec![vec![1], vec![2], vec![]];
        let pd = compute_postdominators(3, &preds, &succs, &[2]);
        assert!(dominates(&pd, 2, 0));
        assert!(dominates(&pd, 2, 1));
    }
}

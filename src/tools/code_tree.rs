//! Module to maintain the adaptive Huffman code tree.
//! This is used by the `fgk` module.
//!
//! The tree starts as a single NYT ("not yet transmitted") leaf.  Each first
//! occurrence of a symbol splits the NYT leaf, and every occurrence walks from
//! the affected node up to the root, exchanging nodes so that the sibling
//! property holds again: listing the nodes by increasing order gives
//! non-decreasing weights, with the two children of a node adjacent.
//!
//! Nodes are kept in an arena and addressed by slot.  Swapping two nodes only
//! rewires links and exchanges orders, so a slot keeps its weight and symbol,
//! which means the symbol table never goes stale.

use bit_vec::BitVec;

/// End of transmission sentinel, follows the byte values
pub const EOT: usize = 256;
/// Number of symbols in the alphabet, bytes plus EOT
pub const SYMBOL_COUNT: usize = EOT + 1;
/// Most nodes the tree can ever hold: one leaf per symbol plus the NYT leaf,
/// and one less branch than there are leaves.
pub const NODE_COUNT: usize = 2 * (SYMBOL_COUNT + 1) - 1;
/// Order handed to the first node (the root), each later node gets one less.
const MAX_ORDER: usize = NODE_COUNT - 1;

#[derive(Debug,Clone)]
struct Node {
    /// occurrences counted through this node
    weight: usize,
    /// bound symbol, None for branches and for the NYT leaf
    symbol: Option<usize>,
    /// position in the sibling ordering
    order: usize,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>
}

/// Tree used for both encoding and decoding.
/// Given the same symbol sequence the encoder and decoder evolve identical trees.
pub struct CodeTree {
    /// arena, the slot is the identity of a node
    nodes: Vec<Node>,
    root: usize,
    nyt: usize,
    /// map from symbols (index) to leaves (value)
    symb_map: Vec<Option<usize>>,
    /// map from orders (index) to nodes (value)
    order_map: Vec<Option<usize>>,
    next_order: usize
}

impl CodeTree {
    pub fn create() -> Self {
        let mut ans = Self {
            nodes: Vec::with_capacity(NODE_COUNT),
            root: 0,
            nyt: 0,
            symb_map: vec![None;SYMBOL_COUNT],
            order_map: vec![None;NODE_COUNT],
            next_order: MAX_ORDER
        };
        ans.reset();
        ans
    }
    /// Discard the whole tree and start over with a lone NYT root.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.symb_map.iter_mut().for_each(|x| *x = None);
        self.order_map.iter_mut().for_each(|x| *x = None);
        self.next_order = MAX_ORDER;
        self.root = self.alloc(None,0,None);
        self.nyt = self.root;
    }
    /// Allocate a node with the next order, panics if the arena is full,
    /// which a bounded alphabet makes impossible.
    fn alloc(&mut self,symbol: Option<usize>,weight: usize,parent: Option<usize>) -> usize {
        assert!(self.nodes.len() < NODE_COUNT,"code tree node arena overflow");
        let slot = self.nodes.len();
        let order = self.next_order;
        self.nodes.push(Node {
            weight,
            symbol,
            order,
            parent,
            left: None,
            right: None
        });
        self.order_map[order] = Some(slot);
        self.next_order = self.next_order.saturating_sub(1);
        slot
    }
    pub fn root(&self) -> usize {
        self.root
    }
    pub fn nyt(&self) -> usize {
        self.nyt
    }
    /// leaf bound to `symbol`, if the symbol has been seen
    pub fn leaf(&self,symbol: usize) -> Option<usize> {
        self.symb_map[symbol]
    }
    pub fn is_leaf(&self,node: usize) -> bool {
        self.nodes[node].left.is_none()
    }
    /// symbol bound to a leaf, None for the NYT leaf or a branch
    pub fn symbol(&self,node: usize) -> Option<usize> {
        self.nodes[node].symbol
    }
    /// descend from a branch, bit 0 is left, 1 is right; None if `node` is a leaf
    pub fn child(&self,node: usize,bit: bool) -> Option<usize> {
        match bit {
            false => self.nodes[node].left,
            true => self.nodes[node].right
        }
    }
    /// Code for a node, root to node, left=0 and right=1.
    /// The root has the empty code.
    pub fn path_of(&self,node: usize) -> BitVec {
        let mut rev: Vec<bool> = Vec::new();
        let mut curr = node;
        while let Some(parent) = self.nodes[curr].parent {
            rev.push(self.nodes[parent].right == Some(curr));
            curr = parent;
        }
        rev.into_iter().rev().collect()
    }
    /// Exchange the positions of two nodes.  Each node takes over the other's
    /// slot in the parent's child links, orders are exchanged by the caller.
    fn swap(&mut self,p: usize,q: usize) {
        let (p_parent,q_parent) = match (self.nodes[p].parent,self.nodes[q].parent) {
            (Some(pp),Some(qp)) => (pp,qp),
            _ => panic!("the root cannot change position")
        };
        // with a shared parent the two links are simply crossed
        if p_parent == q_parent {
            let dad = &mut self.nodes[p_parent];
            std::mem::swap(&mut dad.left,&mut dad.right);
            return;
        }
        let p_link = match self.nodes[p_parent].left == Some(p) {
            true => &mut self.nodes[p_parent].left,
            false => &mut self.nodes[p_parent].right
        };
        *p_link = Some(q);
        let q_link = match self.nodes[q_parent].left == Some(q) {
            true => &mut self.nodes[q_parent].left,
            false => &mut self.nodes[q_parent].right
        };
        *q_link = Some(p);
        self.nodes[p].parent = Some(q_parent);
        self.nodes[q].parent = Some(p_parent);
    }
    /// Node with the largest order among those having `weight`.
    /// Linear search, the caller guarantees at least `fallback` qualifies.
    fn leader(&self,weight: usize,fallback: usize) -> usize {
        self.order_map.iter().rev().flatten().copied()
            .find(|&n| self.nodes[n].weight == weight)
            .unwrap_or(fallback)
    }
    /// Count one occurrence of `symbol` and restore the sibling property.
    pub fn update(&mut self,symbol: usize) {
        let mut curr = match self.symb_map[symbol] {
            Some(leaf) => leaf,
            None => {
                // split the NYT leaf, new symbol goes right, new NYT goes left
                let old_nyt = self.nyt;
                let leaf = self.alloc(Some(symbol),1,Some(old_nyt));
                let nyt = self.alloc(None,0,Some(old_nyt));
                self.nodes[old_nyt].right = Some(leaf);
                self.nodes[old_nyt].left = Some(nyt);
                self.symb_map[symbol] = Some(leaf);
                self.nyt = nyt;
                log::trace!("symbol {} enters the tree at slot {}",symbol,leaf);
                old_nyt
            }
        };
        loop {
            let leader = self.leader(self.nodes[curr].weight,curr);
            if leader != curr && self.nodes[curr].parent != Some(leader) {
                self.swap(curr,leader);
                let p_order = self.nodes[curr].order;
                let q_order = self.nodes[leader].order;
                self.nodes[curr].order = q_order;
                self.nodes[leader].order = p_order;
                self.order_map[q_order] = Some(curr);
                self.order_map[p_order] = Some(leader);
            }
            self.nodes[curr].weight += 1;
            curr = match self.nodes[curr].parent {
                Some(parent) => parent,
                None => break // root was reached
            };
        }
    }
}

// *************** TESTS *****************

#[cfg(test)]
impl CodeTree {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }
    fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.left.is_none()).count()
    }
    fn weight(&self,node: usize) -> usize {
        self.nodes[node].weight
    }
    /// panic if any structural invariant is violated
    fn check(&self) {
        let live = self.nodes.len();
        // orders are unique and fill the top of the range
        assert_eq!(self.order_map.iter().flatten().count(),live);
        for order in 0..NODE_COUNT {
            let expect_live = order + live > MAX_ORDER;
            assert_eq!(self.order_map[order].is_some(),expect_live,"order {} liveness",order);
            if let Some(n) = self.order_map[order] {
                assert_eq!(self.nodes[n].order,order);
            }
        }
        // sibling property: weights do not decrease as order increases
        let by_order: Vec<usize> = self.order_map.iter().flatten().copied().collect();
        for pair in by_order.windows(2) {
            assert!(self.nodes[pair[0]].weight <= self.nodes[pair[1]].weight,
                "order {} outweighs order {}",self.nodes[pair[0]].order,self.nodes[pair[1]].order);
        }
        let mut nyt_count = 0;
        for (slot,node) in self.nodes.iter().enumerate() {
            match (node.left,node.right) {
                (Some(l),Some(r)) => {
                    assert_eq!(node.symbol,None);
                    assert_eq!(node.weight,self.nodes[l].weight + self.nodes[r].weight);
                    assert_eq!(self.nodes[r].order,self.nodes[l].order + 1);
                    assert_eq!(self.nodes[l].parent,Some(slot));
                    assert_eq!(self.nodes[r].parent,Some(slot));
                },
                (None,None) => match node.symbol {
                    Some(s) => assert_eq!(self.symb_map[s],Some(slot)),
                    None => {
                        assert_eq!(node.weight,0);
                        assert_eq!(slot,self.nyt);
                        nyt_count += 1;
                    }
                },
                _ => panic!("node {} has one child",slot)
            }
        }
        assert_eq!(nyt_count,1);
        assert_eq!(self.nodes[self.root].parent,None);
        assert_eq!(self.nodes[self.root].order,MAX_ORDER);
    }
}

#[cfg(test)]
fn bits(s: &str) -> BitVec {
    s.chars().map(|c| c=='1').collect()
}

#[test]
fn fresh_tree() {
    let tree = CodeTree::create();
    assert_eq!(tree.node_count(),1);
    assert_eq!(tree.root(),tree.nyt());
    assert!(tree.is_leaf(tree.root()));
    assert_eq!(tree.path_of(tree.nyt()),BitVec::new());
    tree.check();
}

#[test]
fn first_symbol_splits_nyt() {
    let mut tree = CodeTree::create();
    tree.update(b'A' as usize);
    assert_eq!(tree.node_count(),3);
    let leaf = tree.leaf(b'A' as usize).unwrap();
    assert_eq!(tree.path_of(leaf),bits("1"));
    assert_eq!(tree.path_of(tree.nyt()),bits("0"));
    assert_eq!(tree.weight(tree.root()),1);
    tree.check();
}

#[test]
fn codes_follow_frequency() {
    // AAAAB leaves A heavy on the right with B and NYT below the left branch
    let mut tree = CodeTree::create();
    for c in "AAAAB".bytes() {
        tree.update(c as usize);
        tree.check();
    }
    assert_eq!(tree.path_of(tree.leaf(b'A' as usize).unwrap()),bits("1"));
    assert_eq!(tree.path_of(tree.leaf(b'B' as usize).unwrap()),bits("01"));
    assert_eq!(tree.path_of(tree.nyt()),bits("00"));
    assert_eq!(tree.weight(tree.root()),5);
}

#[test]
fn rising_symbol_is_promoted() {
    // after B overtakes A, B must hold the short code
    let mut tree = CodeTree::create();
    for c in "ABBB".bytes() {
        tree.update(c as usize);
        tree.check();
    }
    assert_eq!(tree.path_of(tree.leaf(b'B' as usize).unwrap()),bits("1"));
    assert_eq!(tree.path_of(tree.leaf(b'A' as usize).unwrap()).len(),2);
}

#[test]
fn invariants_hold_after_every_update() {
    let mut tree = CodeTree::create();
    let text = "I am Sam. Sam I am. I do not like this Sam I am.\n\
        Colorless green ideas sleep furiously, abracadabra mississippi 0123456789";
    for c in text.bytes() {
        tree.update(c as usize);
        tree.check();
    }
    tree.update(EOT);
    tree.check();
}

#[test]
fn full_alphabet_fits() {
    let mut tree = CodeTree::create();
    for round in 0..3 {
        for s in 0..256 {
            tree.update((s * 7 + round) % 256);
        }
        tree.check();
    }
    tree.update(EOT);
    tree.check();
    assert_eq!(tree.node_count(),NODE_COUNT);
    assert_eq!(tree.leaf_count(),SYMBOL_COUNT + 1);
}

#[test]
fn single_symbol_stays_small() {
    let mut tree = CodeTree::create();
    for _i in 0..8 {
        tree.update(b'B' as usize);
        assert!(tree.leaf_count() <= 2);
        tree.check();
    }
    tree.update(EOT);
    assert_eq!(tree.leaf_count(),3);
    tree.check();
}

#[test]
fn reset_leaves_no_residue() {
    let mut tree = CodeTree::create();
    for c in "hello world".bytes() {
        tree.update(c as usize);
    }
    tree.reset();
    assert_eq!(tree.node_count(),1);
    assert_eq!(tree.leaf(b'h' as usize),None);
    assert_eq!(tree.root(),tree.nyt());
    tree.check();
    tree.update(b'z' as usize);
    assert_eq!(tree.path_of(tree.leaf(b'z' as usize).unwrap()),bits("1"));
    tree.check();
}

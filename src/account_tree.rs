use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::error::Error;
use crate::journal::{AccName, Journal};

type NodeId = usize;

/// The synthetic root is always the first node of the arena.
const ROOT: NodeId = 0;

/// A node of the account tree.
///
/// A node may stand for several levels of the account hierarchy at
/// once (`segment` holds more than one part) as long as no other
/// account diverges within that run.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    segment: Vec<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    /// true if an inserted account ends exactly at this node
    declared: bool,
    amount: Decimal,
}

/// One row of the pre-order walk over the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRow {
    /// the segments of this node only
    pub name: AccName,
    /// the segments from the top level account down to this node
    pub full_name: AccName,
    /// depth of the node, top level accounts are at level 0
    pub level: usize,
    pub amount: Decimal,
}

/// A compressed prefix tree of account names, used to sum amounts
/// over the account hierarchy.
///
/// The tree goes through three phases: accounts are `insert`ed, then
/// amounts are `register`ed against them, and finally the tree is
/// folded with `accumulate`, which turns it into a read-only
/// [`Summary`].
///
/// ```text
/// insert Assets:Bank:Checking, Assets:Bank:Savings, Assets:Cash
///
///   Assets
///   |-- Bank
///   |   |-- Checking
///   |   `-- Savings
///   `-- Cash
///
/// insert Expenses:Food:Restaurant only
///
///   Expenses:Food:Restaurant
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTree {
    nodes: Vec<Node>,
}

/// An accumulated account tree: every node amount is its own
/// registered amount plus the amounts of all its descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    tree: AccountTree,
}

impl Default for AccountTree {
    fn default() -> Self {
        AccountTree {
            nodes: vec![Node::new(Vec::new(), None)],
        }
    }
}

impl Node {
    fn new(segment: Vec<String>, parent: Option<NodeId>) -> Node {
        Node {
            segment,
            children: Vec::new(),
            parent,
            declared: false,
            amount: Decimal::ZERO,
        }
    }
}

impl AccountTree {
    /// Creates an empty tree.
    pub fn new() -> AccountTree {
        Self::default()
    }

    /// Creates a tree holding the given accounts. Accounts are
    /// inserted in lexicographic order.
    pub fn from_accounts(accounts: impl IntoIterator<Item = AccName>) -> AccountTree {
        let mut accounts = accounts.into_iter().collect::<Vec<_>>();
        accounts.sort();

        let mut tree = AccountTree::new();
        for acc in &accounts {
            tree.insert(acc);
        }

        debug!(
            accounts = accounts.len(),
            nodes = tree.nodes.len() - 1,
            "account tree built"
        );
        tree
    }

    /// Adds an account to the tree, if not already present.
    ///
    /// Looks for the child sharing the longest run of leading segments
    /// with the remaining path (the first one wins on ties). If that
    /// child only partially matches it is split in two, so that no
    /// two siblings ever share a leading segment.
    pub fn insert(&mut self, account: &AccName) {
        let path = account.segments().collect::<Vec<_>>();
        let mut at = ROOT;
        let mut rest = &path[..];

        while !rest.is_empty() {
            let best = self.nodes[at]
                .children
                .iter()
                .map(|&c| (c, common_prefix_len(&self.nodes[c].segment, rest)))
                .fold(None, |best: Option<(NodeId, usize)>, (c, s)| match best {
                    Some((_, bs)) if bs >= s => best,
                    _ if s > 0 => Some((c, s)),
                    _ => best,
                });

            let Some((child, s)) = best else {
                let id = self.push_node(rest.iter().map(|s| s.to_string()).collect(), at);
                self.nodes[id].declared = true;
                return;
            };

            if s < self.nodes[child].segment.len() {
                self.split(child, s);
            }

            at = child;
            rest = &rest[s..];
        }

        self.nodes[at].declared = true;
    }

    /// Adds `amount` to the node that matches exactly `account`.
    ///
    /// Fails with `Error::UnknownAccount` if `account` was never
    /// inserted.
    pub fn register(&mut self, account: &AccName, amount: Decimal) -> Result<(), Error> {
        let id = self
            .find(account)
            .filter(|&id| self.nodes[id].declared)
            .ok_or_else(|| Error::UnknownAccount(account.clone()))?;

        self.nodes[id].amount += amount;
        Ok(())
    }

    /// Registers the amount of every transaction of the journal.
    pub fn fill(&mut self, journal: &Journal) -> Result<(), Error> {
        for x in journal.xacts() {
            self.register(&x.account, x.amount)?;
        }

        debug!(xacts = journal.len(), "account tree filled");
        Ok(())
    }

    /// Folds the tree bottom-up: the amount of every node becomes its
    /// own amount plus the amounts of all its descendants.
    pub fn accumulate(mut self) -> Summary {
        // children always come after their parent in pre-order, so the
        // reversed walk visits every child before its parent
        let order = self.preorder();
        for &id in order.iter().rev() {
            let sub = self.nodes[id]
                .children
                .iter()
                .map(|&c| self.nodes[c].amount)
                .sum::<Decimal>();
            self.nodes[id].amount += sub;
        }

        Summary { tree: self }
    }

    /// Returns the rows of the tree in depth-first pre-order, skipping
    /// the root. Each call starts a new walk.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            tree: self,
            stack: self.nodes[ROOT]
                .children
                .iter()
                .rev()
                .map(|&c| (c, 0, AccName::default()))
                .collect(),
        }
    }

    /// Returns the names of all accounts ending at a leaf node.
    pub fn leaves(&self) -> Vec<AccName> {
        self.preorder()
            .into_iter()
            .filter(|&id| id != ROOT && self.nodes[id].children.is_empty())
            .map(|id| self.full_name(id))
            .collect()
    }

    /// Joins the segments of every node from the top level account
    /// down to `id`.
    fn full_name(&self, id: NodeId) -> AccName {
        let mut chain = Vec::new();
        let mut curr = Some(id);
        while let Some(n) = curr.filter(|&n| n != ROOT) {
            chain.push(n);
            curr = self.nodes[n].parent;
        }

        AccName::from_segments(
            chain
                .iter()
                .rev()
                .flat_map(|&n| self.nodes[n].segment.iter()),
        )
    }

    fn find(&self, account: &AccName) -> Option<NodeId> {
        let path = account.segments().collect::<Vec<_>>();
        let mut at = ROOT;
        let mut rest = &path[..];

        while !rest.is_empty() {
            // siblings are prefix disjoint, at most one child matches
            let child = self.nodes[at].children.iter().copied().find(|&c| {
                let seg = &self.nodes[c].segment;
                seg.len() <= rest.len() && common_prefix_len(seg, rest) == seg.len()
            })?;

            rest = &rest[self.nodes[child].segment.len()..];
            at = child;
        }

        (at != ROOT).then_some(at)
    }

    fn push_node(&mut self, segment: Vec<String>, parent: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(segment, Some(parent)));
        self.nodes[parent].children.push(id);
        id
    }

    /// Splits `id` after its first `at` segments. The tail becomes a
    /// new node that takes over the children of `id`, and is left as
    /// the only child of `id`.
    fn split(&mut self, id: NodeId, at: usize) {
        let tail_id = self.nodes.len();
        let node = &mut self.nodes[id];

        let tail = Node {
            segment: node.segment.split_off(at),
            children: std::mem::replace(&mut node.children, vec![tail_id]),
            parent: Some(id),
            declared: std::mem::take(&mut node.declared),
            amount: std::mem::take(&mut node.amount),
        };

        for &c in &tail.children {
            self.nodes[c].parent = Some(tail_id);
        }
        self.nodes.push(tail);
    }

    fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }

        order
    }
}

impl Summary {
    /// See [`AccountTree::iter`].
    pub fn iter(&self) -> Iter<'_> {
        self.tree.iter()
    }

    /// Sum of all registered amounts.
    pub fn total(&self) -> Decimal {
        self.tree.nodes[ROOT].amount
    }

    /// Accumulated amount of the node matching exactly `account`.
    pub fn amount_of(&self, account: &AccName) -> Option<Decimal> {
        self.tree.find(account).map(|id| self.tree.nodes[id].amount)
    }

    /// Returns the underlying (already accumulated) tree.
    pub fn tree(&self) -> &AccountTree {
        &self.tree
    }
}

/// Pre-order iterator over the rows of an [`AccountTree`].
pub struct Iter<'t> {
    tree: &'t AccountTree,
    /// pending nodes along with their level and parent full name
    stack: Vec<(NodeId, usize, AccName)>,
}

impl Iterator for Iter<'_> {
    type Item = AccountRow;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, level, parent) = self.stack.pop()?;
        let node = &self.tree.nodes[id];

        let name = AccName::from_segments(&node.segment);
        let full_name = parent.append(&name);

        self.stack.extend(
            node.children
                .iter()
                .rev()
                .map(|&c| (c, level + 1, full_name.clone())),
        );

        Some(AccountRow {
            name,
            full_name,
            level,
            amount: node.amount,
        })
    }
}

impl<'t> IntoIterator for &'t Summary {
    type Item = AccountRow;
    type IntoIter = Iter<'t>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Number of leading elements shared by `a` and `b`.
fn common_prefix_len<A, B>(a: &[A], b: &[B]) -> usize
where
    A: PartialEq<B>,
{
    a.iter().zip(b).take_while(|(x, y)| *x == *y).count()
}

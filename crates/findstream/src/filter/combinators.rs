//! Filter combinators.

use async_trait::async_trait;

use super::{Decision, DynFilter, Filter};
use crate::error::Result;
use crate::node::PathNode;

/// Negates `include`. Pruning decided by the inner filter still applies.
#[derive(Debug, Clone)]
pub struct Not {
    inner: DynFilter,
}

impl Not {
    pub fn new(inner: DynFilter) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Filter for Not {
    async fn decide(&self, node: &PathNode) -> Result<Decision> {
        let decision = self.inner.decide(node).await?;
        Ok(Decision::new(!decision.include, decision.ascend))
    }
}

/// Left-to-right conjunction, stopping at the first exclusion.
///
/// On exclusion, `ascend` is the OR of the filters that included the node
/// before it; the excluding filter's own `ascend` is dropped.
#[derive(Debug, Clone)]
pub struct And {
    filters: Vec<DynFilter>,
}

impl And {
    pub fn new(filters: Vec<DynFilter>) -> Self {
        Self { filters }
    }
}

#[async_trait]
impl Filter for And {
    async fn decide(&self, node: &PathNode) -> Result<Decision> {
        let mut ascend = false;
        for filter in &self.filters {
            let decision = filter.decide(node).await?;
            if !decision.include {
                return Ok(Decision::new(false, ascend));
            }
            ascend |= decision.ascend;
        }
        Ok(Decision::new(true, ascend))
    }
}

/// Left-to-right disjunction, stopping at the first inclusion.
///
/// A match carries the `ascend` of every filter evaluated so far. When
/// nothing matches the result is a plain exclusion.
#[derive(Debug, Clone)]
pub struct Or {
    filters: Vec<DynFilter>,
}

impl Or {
    pub fn new(filters: Vec<DynFilter>) -> Self {
        Self { filters }
    }
}

#[async_trait]
impl Filter for Or {
    async fn decide(&self, node: &PathNode) -> Result<Decision> {
        let mut ascend = false;
        for filter in &self.filters {
            let decision = filter.decide(node).await?;
            ascend |= decision.ascend;
            if decision.include {
                return Ok(Decision::new(true, ascend));
            }
        }
        Ok(Decision::EXCLUDE)
    }
}

/// A match also halts descent.
#[derive(Debug, Clone)]
pub struct Prune {
    inner: DynFilter,
}

impl Prune {
    pub fn new(inner: DynFilter) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Filter for Prune {
    async fn decide(&self, node: &PathNode) -> Result<Decision> {
        let Decision { include, .. } = self.inner.decide(node).await?;
        Ok(Decision::new(include, include))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::filter::testing::Fixed;
    use crate::filter::{and, never, not, or, prune};
    use crate::fs::MemoryFs;

    fn node() -> PathNode {
        PathNode::root(".", Arc::new(MemoryFs::new()))
    }

    #[tokio::test]
    async fn not_keeps_ascend() {
        let decision = not(Fixed::new(true, true)).decide(&node()).await.unwrap();
        assert_eq!(decision, Decision::new(false, true));
    }

    #[tokio::test]
    async fn prune_ascends_only_on_match() {
        let matched = prune(Fixed::new(true, false)).decide(&node()).await.unwrap();
        assert_eq!(matched, Decision::new(true, true));

        let missed = prune(Fixed::new(false, true)).decide(&node()).await.unwrap();
        assert_eq!(missed, Decision::new(false, false));
    }

    #[tokio::test]
    async fn and_short_circuits_on_exclusion() {
        let first = Fixed::new(true, true);
        let excluding = Fixed::new(false, false);
        let skipped = Fixed::new(true, false);
        let filter = and(vec![
            first.as_filter(),
            excluding.as_filter(),
            skipped.as_filter(),
        ]);

        let decision = filter.decide(&node()).await.unwrap();
        assert_eq!(decision, Decision::new(false, true));
        assert_eq!(first.calls(), 1);
        assert_eq!(excluding.calls(), 1);
        assert_eq!(skipped.calls(), 0);
    }

    #[tokio::test]
    async fn and_drops_ascend_of_the_excluding_filter() {
        let filter = and(vec![
            Fixed::new(true, false).as_filter(),
            Fixed::new(false, true).as_filter(),
        ]);
        let decision = filter.decide(&node()).await.unwrap();
        assert_eq!(decision, Decision::EXCLUDE);
    }

    #[tokio::test]
    async fn and_ors_ascend_when_all_pass() {
        let filter = and(vec![
            Fixed::new(true, false).as_filter(),
            Fixed::new(true, true).as_filter(),
        ]);
        assert_eq!(
            filter.decide(&node()).await.unwrap(),
            Decision::new(true, true)
        );
        assert_eq!(and(Vec::new()).decide(&node()).await.unwrap(), Decision::INCLUDE);
    }

    #[tokio::test]
    async fn or_carries_prior_ascend_into_a_match() {
        let skipped = Fixed::new(true, false);
        let filter = or(vec![
            Fixed::new(false, true).as_filter(),
            Fixed::new(true, false).as_filter(),
            skipped.as_filter(),
        ]);

        assert_eq!(
            filter.decide(&node()).await.unwrap(),
            Decision::new(true, true)
        );
        assert_eq!(skipped.calls(), 0);
    }

    #[tokio::test]
    async fn or_without_match_is_plain_exclusion() {
        let filter = or(vec![Fixed::new(false, true).as_filter(), never()]);
        assert_eq!(filter.decide(&node()).await.unwrap(), Decision::EXCLUDE);
        assert_eq!(or(Vec::new()).decide(&node()).await.unwrap(), Decision::EXCLUDE);
    }
}

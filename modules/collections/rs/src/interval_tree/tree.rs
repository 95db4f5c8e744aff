use splicekit_core_rs::{loc::Interval, num::PrimInt};

/// A builder for constructing interval tree data structures.
///
/// Intervals and their associated data elements are added incrementally. Once all intervals are
/// added, `build` constructs the final tree structure optimized for queries.
pub trait Builder {
    /// The type of interval tree that will be constructed.
    type Target: ITree;

    /// Add an interval and its corresponding element to the tree.
    fn add(
        self,
        interval: Interval<<Self::Target as ITree>::Idx>,
        element: <Self::Target as ITree>::Data,
    ) -> Self;

    /// Extend the tree from an iterator of intervals and their corresponding elements.
    fn extend(
        self,
        data: impl IntoIterator<
            Item = (
                Interval<<Self::Target as ITree>::Idx>,
                <Self::Target as ITree>::Data,
            ),
        >,
    ) -> Self;

    /// Build and return the final interval tree structure.
    fn build(self) -> Self::Target;
}

/// Interval tree for finding stored intervals that overlap with a query.
pub trait ITree {
    /// The type used for interval coordinates (start and end positions).
    type Idx: PrimInt;

    /// The type of data associated with each interval in the tree.
    type Data;

    /// Returns an iterator over all data values stored in the tree.
    ///
    /// The order of elements in the iterator is implementation-defined and should not be relied upon.
    fn data(&self) -> impl Iterator<Item = &Self::Data> + '_;

    /// Returns an iterator over all intervals stored in the tree.
    fn intervals(&self) -> impl Iterator<Item = Interval<Self::Idx>>;

    /// Returns an iterator over all (interval, data) pairs stored in the tree.
    fn records(&self) -> impl Iterator<Item = (Interval<Self::Idx>, &Self::Data)>;

    /// Finds all entries whose intervals intersect with the given query interval.
    ///
    /// Results are placed into the provided `buffer`, overwriting its previous contents.
    /// Touching intervals are not reported.
    fn intersect_interval<'tree>(
        &'tree self,
        interval: &Interval<Self::Idx>,
        buffer: &mut Vec<(Interval<Self::Idx>, &'tree Self::Data)>,
    );
}

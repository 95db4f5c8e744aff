use std::fmt::Debug;

/// T values are primitive integers
pub trait PrimInt: ::num::PrimInt + Debug + Default {}
impl<T: ::num::PrimInt + Debug + Default> PrimInt for T {}

/// T values are non-negative primitive integers
pub trait PrimUInt: PrimInt + ::num::Unsigned {}
impl<T: PrimInt + ::num::Unsigned> PrimUInt for T {}

/// Signed distance `pos - origin` between two coordinates. Returns `None` if either value or the
/// result doesn't fit into i64.
pub fn signed_distance<Idx: PrimInt>(pos: Idx, origin: Idx) -> Option<i64> {
    let pos = pos.to_i64()?;
    let origin = origin.to_i64()?;
    pos.checked_sub(origin)
}

//! # Slot Partitioner Module / 槽位划分模块
//!
//! Deals an ordered spec list into slots with a snake (boustrophedon) round
//! robin: even cycles take from the front of the list, odd cycles from the back.
//! With a slowest-first list this keeps slot 0 from collecting the slowest spec
//! of every cycle.
//!
//! 以蛇形（往返式）轮询将有序的 spec 列表分配到槽位：偶数轮从列表前端取，
//! 奇数轮从列表末端取。对于最慢优先的列表，这可避免槽位 0 每轮都拿到最慢的 spec。

use crate::core::error::SchedulingError;

/// Splits `ordered` into at most `slot_count` non-empty buckets.
///
/// Each cycle visits the slots `0..slot_count` in order. On even cycles the next
/// item from the front of the remaining list is dealt, on odd cycles the next
/// item from the back. Slots that receive nothing are not returned, so an empty
/// input yields no buckets at all.
///
/// 将 `ordered` 划分为至多 `slot_count` 个非空桶。
/// 每一轮按顺序访问槽位 `0..slot_count`。偶数轮从剩余列表前端取下一项，
/// 奇数轮从末端取。没有分到任何项的槽位不会返回，因此空输入不产生任何桶。
///
/// # Errors / 错误
/// Returns [`SchedulingError::InvalidSlotCount`] when `slot_count` is zero.
pub fn partition<T: Clone>(
    ordered: &[T],
    slot_count: usize,
) -> Result<Vec<Vec<T>>, SchedulingError> {
    if slot_count == 0 {
        return Err(SchedulingError::InvalidSlotCount { slots: slot_count });
    }

    let mut buckets: Vec<Vec<T>> = vec![Vec::new(); slot_count];
    // Remaining items are ordered[front..back].
    let (mut front, mut back) = (0, ordered.len());
    let mut cycle = 0usize;

    while front < back {
        for bucket in buckets.iter_mut() {
            if front == back {
                break;
            }
            if cycle % 2 == 0 {
                bucket.push(ordered[front].clone());
                front += 1;
            } else {
                back -= 1;
                bucket.push(ordered[back].clone());
            }
        }
        cycle += 1;
    }

    buckets.retain(|bucket| !bucket.is_empty());
    Ok(buckets)
}

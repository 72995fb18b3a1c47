//! 组合计算服务 - 业务能力层
//!
//! 按词条顺序为每个词条挑出最便宜和评价最多的有货商品，累加成两个组合。

use crate::models::{CombinationBundle, Listing, TermResult};

/// 计算 (最便宜组合, 评价最多组合)
///
/// 没有有货商品的词条不参与任何组合；全部词条都无货时两个组合都为空、总价为 0。
pub fn aggregate(results: &TermResult) -> (CombinationBundle, CombinationBundle) {
    let mut cheapest = CombinationBundle::default();
    let mut most_reviewed = CombinationBundle::default();

    for entry in results.iter() {
        if let Some(pick) = cheapest_pick(&entry.listings) {
            cheapest.push(pick.clone());
        }
        if let Some(pick) = most_reviewed_pick(&entry.listings) {
            most_reviewed.push(pick.clone());
        }
    }

    (cheapest, most_reviewed)
}

/// 价格最低的有货商品，同价取先出现的
pub fn cheapest_pick(listings: &[Listing]) -> Option<&Listing> {
    listings
        .iter()
        .filter(|l| l.is_available)
        .fold(None, |best: Option<&Listing>, candidate| match best {
            Some(current) if current.price <= candidate.price => Some(current),
            _ => Some(candidate),
        })
}

/// 评价数最多的有货商品，同数取先出现的
pub fn most_reviewed_pick(listings: &[Listing]) -> Option<&Listing> {
    listings
        .iter()
        .filter(|l| l.is_available)
        .fold(None, |best: Option<&Listing>, candidate| match best {
            Some(current) if current.review_count >= candidate.review_count => Some(current),
            _ => Some(candidate),
        })
}

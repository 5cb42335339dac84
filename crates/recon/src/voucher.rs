use crate::config::VoucherConfig;
use crate::model::MaterialLine;

/// Assign a material category to each consumption line from its voucher mode.
///
/// With `require_tracked`, lines whose voucher mode is neither consumable nor
/// rotable (or missing) are dropped. Input order is preserved.
pub fn classify_consumption(lines: &[MaterialLine], vouchers: &VoucherConfig) -> Vec<MaterialLine> {
    let mut out = Vec::with_capacity(lines.len());
    let mut dropped = 0usize;

    for line in lines {
        let category = line.voucher.as_deref().and_then(|v| vouchers.categorize(v));
        if category.is_none() && vouchers.require_tracked {
            dropped += 1;
            continue;
        }
        let mut line = line.clone();
        line.category = category;
        out.push(line);
    }

    if dropped > 0 {
        log::debug!(
            "voucher filter dropped {dropped} of {} consumption lines",
            lines.len()
        );
    }

    out
}

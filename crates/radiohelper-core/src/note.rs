//! 病史记录文本生成

use crate::models::{AnamnesisFieldSet, DoseEstimate, Operations, Pregnancy, Trauma};

/// 否认（"无"选项及空主诉的输出）
pub const DENIES: &str = "denies";

/// 已选择手术/植入物但未填写细节时的占位提示
pub const CLARIFY_PLACEHOLDER: &str = "(clarify)";

/// "无主诉"快捷短语
pub const NO_COMPLAINTS: &str = "no complaints";

/// 按固定顺序生成病史记录
///
/// 剂量行只在调用方传入先前计算的估算结果时出现。
pub fn compose_note(fields: &AnamnesisFieldSet, dose: Option<&DoseEstimate>) -> String {
    let mut lines = Vec::with_capacity(9);

    let complaints = fields.complaints.trim();
    let complaints = if complaints.is_empty() { DENIES } else { complaints };
    lines.push(format!("Complaints: {}", complaints));
    lines.push(format!("Trauma: {}", trauma_text(fields.trauma)));
    lines.push(format!(
        "Operations/implants: {}",
        operations_text(fields.operations, &fields.operations_detail)
    ));
    lines.push(format!("Contrast allergy: {}", fields.contrast_allergy.label()));

    if fields.pregnancy != Pregnancy::NotApplicable {
        lines.push(format!("Pregnancy: {}", fields.pregnancy.label()));
    }

    push_optional(&mut lines, "Preparation/diet", &fields.preparation);
    push_optional(&mut lines, "Referral comment", &fields.referrer_comment);
    push_optional(&mut lines, "Risk notes", &fields.risk_notes);

    if let Some(dose) = dose {
        lines.push(dose.text.clone());
    }

    lines.join("\n")
}

fn trauma_text(trauma: Trauma) -> &'static str {
    match trauma {
        Trauma::None => DENIES,
        other => other.label(),
    }
}

fn operations_text(operations: Operations, detail: &str) -> String {
    if operations == Operations::None {
        return DENIES.to_string();
    }

    let detail = detail.trim();
    if detail.is_empty() {
        format!("{} {}", operations.label(), CLARIFY_PLACEHOLDER)
    } else {
        format!("{} ({})", operations.label(), detail)
    }
}

fn push_optional(lines: &mut Vec<String>, label: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        lines.push(format!("{}: {}", label, value));
    }
}

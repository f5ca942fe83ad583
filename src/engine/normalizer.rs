// ==========================================
// 调拨单分配系统 - 代码规范化
// ==========================================
// 职责: 员工代码/仓库代码/单据号的规范化与归属比较
// 规则: 兼容分解 → 去除组合附加符 → 压缩空白 → 去首尾空白 → 大写
// 红线: 空串不与任何代码相等
// ==========================================

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// 去除变音符号（含越南语 đ/Đ）
pub fn strip_diacritics(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect()
}

/// 压缩内部空白并去除首尾空白
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 规范化代码
///
/// # 示例
/// ```
/// use voucher_alloc::engine::normalizer::normalize;
/// assert_eq!(normalize("  kho   Hà nội "), "KHO HA NOI");
/// assert_eq!(normalize("   "), "");
/// ```
pub fn normalize(code: &str) -> String {
    collapse_whitespace(&strip_diacritics(code)).to_uppercase()
}

/// 表头匹配键（去变音 + 小写），用于列名模糊识别
pub fn header_key(s: &str) -> String {
    collapse_whitespace(&strip_diacritics(s)).to_lowercase()
}

// ==========================================
// CodeVariants - 比较用变体
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeVariants {
    pub raw: String,      // 规范化原值
    pub no_zeros: String, // 去前导零
}

impl CodeVariants {
    pub fn of(code: &str) -> Self {
        let raw = normalize(code);
        let no_zeros = raw.trim_start_matches('0').to_string();
        Self { raw, no_zeros }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// 四向比较：raw/no_zeros 两两比较，任一相等即视为同一代码
    ///
    /// 双方原值都非空时才比较；全零代码去零后同为空串，彼此相等（"0" == "00"）。
    pub fn matches(&self, other: &CodeVariants) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let mine = [self.raw.as_str(), self.no_zeros.as_str()];
        let theirs = [other.raw.as_str(), other.no_zeros.as_str()];
        mine.iter().any(|a| theirs.contains(a))
    }
}

/// 两个代码在归属判定意义下是否相等
pub fn codes_match(a: &str, b: &str) -> bool {
    CodeVariants::of(a).matches(&CodeVariants::of(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_diacritics_and_case() {
        assert_eq!(normalize("nv-đức"), "NV-DUC");
        assert_eq!(normalize("Kho\tSố  1"), "KHO SO 1");
        assert_eq!(normalize("ｋｈｏ１"), "KHO1");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n "), "");
    }

    #[test]
    fn test_leading_zero_equivalence() {
        assert!(codes_match("007", "7"));
        assert!(codes_match("7", "007"));
        assert!(codes_match("007", "0007"));
        assert!(codes_match("w1", "W1"));
        assert!(!codes_match("70", "7"));
    }

    #[test]
    fn test_empty_never_matches() {
        assert!(!codes_match("", ""));
        assert!(!codes_match("  ", "0"));
        assert!(!codes_match("000", "0A"));
    }

    #[test]
    fn test_all_zero_codes_match_across_lengths() {
        assert!(codes_match("0", "00"));
        assert!(codes_match("000", "0"));
        assert!(codes_match("000", "000"));
        assert!(!codes_match("0", ""));
        assert!(!codes_match("0", "1"));
    }

    #[test]
    fn test_header_key() {
        assert_eq!(header_key("Mã Chứng Từ"), "ma chung tu");
        assert_eq!(header_key(" Nơi  Xuất "), "noi xuat");
    }
}

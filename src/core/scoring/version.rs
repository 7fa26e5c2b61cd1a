use crate::utils::error::ScoreError;
use regex::Regex;
use std::sync::LazyLock;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v(\d+)\.(\d+)").expect("version pattern is valid"));

/// 從檔名取出第一個 `v<major>.<minor>`；找不到就是錯誤，不會回傳預設版本
pub fn find_version_number(filename: &str) -> Result<(u32, u32), ScoreError> {
    let not_found = || ScoreError::VersionNotFound {
        filename: filename.to_string(),
    };

    let caps = VERSION_PATTERN.captures(filename).ok_or_else(not_found)?;
    let major = caps[1].parse::<u32>().map_err(|_| not_found())?;
    let minor = caps[2].parse::<u32>().map_err(|_| not_found())?;
    Ok((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_version_number() {
        let cases = [
            ("123456789-BGS_v1.1-data-management-plan.docx", (1, 1)),
            ("123456789-GEO_v1.2-data-management-plan.docx", (1, 2)),
            ("123456789-ZKS_v2.4-data-management-plan.docx", (2, 4)),
            ("123456789-DSC_v5.10-data-management-plan.docx", (5, 10)),
            ("123456789-BGS_v10.100-data-management-plan.docx", (10, 100)),
            ("123-ABC_v2.4-data-management-plan.docx", (2, 4)),
        ];
        for (filename, expected) in cases {
            assert_eq!(find_version_number(filename).unwrap(), expected, "{}", filename);
        }
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(find_version_number("draft_v3.1_of_v2.0.docx").unwrap(), (3, 1));
    }

    #[test]
    fn test_full_path_is_searched() {
        assert_eq!(
            find_version_number("/share/1000/A. Contractual items/1000-AB_v2.0-data-management-plan.docx")
                .unwrap(),
            (2, 0)
        );
    }

    #[test]
    fn test_no_version_is_an_error() {
        for filename in ["randomfile.docx", "", "vasds", "v1asds", "V1.2-upper.docx"] {
            assert!(
                matches!(
                    find_version_number(filename),
                    Err(ScoreError::VersionNotFound { .. })
                ),
                "{:?} should not yield a version",
                filename
            );
        }
    }

    #[test]
    fn test_overflowing_digits_are_not_a_version() {
        assert!(find_version_number("x_v99999999999.1.docx").is_err());
    }
}

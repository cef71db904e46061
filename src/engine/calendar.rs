// ==========================================
// 生产成本台账系统 - 日历分桶工具
// ==========================================
// 职责: 把日期映射到 day/week 桶键
// - day 桶键 = 日期本身 (YYYY-MM-DD)
// - week 桶键 = 所在 ISO 周的周一 (YYYY-MM-DD)
// 红线: 纯函数, 任何合法日期都恰好落入一个桶
// ==========================================

use chrono::{Datelike, Duration, NaiveDate};

/// day 模式桶键: 日期格式化为 YYYY-MM-DD
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 日期所在 ISO 周的周一
///
/// ISO 周从周一开始; 跨月/跨年不影响归属 (同一 ISO 周恒为同一个周一)
pub fn iso_week_start(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(days_from_monday)
}

/// week 模式桶键: 所在 ISO 周的周一, 格式化为 YYYY-MM-DD
pub fn week_key(date: NaiveDate) -> String {
    iso_week_start(date).format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("测试日期非法")
    }

    #[test]
    fn test_day_key_format() {
        assert_eq!(day_key(make_date(2024, 3, 4)), "2024-03-04");
        assert_eq!(day_key(make_date(2024, 12, 31)), "2024-12-31");
    }

    #[test]
    fn test_same_iso_week_same_key() {
        // 2024-03-04 是周一, 2024-03-10 是同周周日
        let monday = make_date(2024, 3, 4);
        let sunday = make_date(2024, 3, 10);
        assert_eq!(week_key(monday), week_key(sunday));
        assert_eq!(week_key(monday), "2024-03-04");
    }

    #[test]
    fn test_monday_vs_preceding_sunday_differ() {
        // 周一与它前一天的周日必须落入不同的桶
        let monday = make_date(2024, 3, 4);
        let preceding_sunday = make_date(2024, 3, 3);
        assert_ne!(week_key(monday), week_key(preceding_sunday));
        assert_eq!(week_key(preceding_sunday), "2024-02-26");
    }

    #[test]
    fn test_week_key_stable_across_month_boundary() {
        // 2024-02-26(周一) 与 2024-03-01(周五) 同属一个 ISO 周
        assert_eq!(week_key(make_date(2024, 2, 26)), "2024-02-26");
        assert_eq!(week_key(make_date(2024, 3, 1)), "2024-02-26");
    }

    #[test]
    fn test_week_key_stable_across_year_boundary() {
        // 2024-12-30(周一) 与 2025-01-02(周四) 同属一个 ISO 周
        assert_eq!(week_key(make_date(2024, 12, 30)), "2024-12-30");
        assert_eq!(week_key(make_date(2025, 1, 2)), "2024-12-30");
    }

    #[test]
    fn test_iso_week_start_on_leap_day() {
        // 2024-02-29 是周四, 所在周的周一为 2024-02-26
        assert_eq!(iso_week_start(make_date(2024, 2, 29)), make_date(2024, 2, 26));
    }
}

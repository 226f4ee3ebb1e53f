use time::{Date, Duration, OffsetDateTime};

use super::repo_types::MealPlan;

pub const PLAN_DAYS: i64 = 7;

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Sunday on or before `day`.
pub fn start_of_week(day: Date) -> Date {
    day - Duration::days(day.weekday().number_days_from_sunday() as i64)
}

/// Inclusive `[start, start + 6]` window of a new plan.
pub fn plan_window(start: Date) -> (Date, Date) {
    (start, start + Duration::days(PLAN_DAYS - 1))
}

pub fn weekly_plan_name(start: Date) -> String {
    format!("Weekly Plan - {start}")
}

/// Missing or non-positive servings count as one.
pub fn normalize_servings(servings: Option<i32>) -> i32 {
    servings.filter(|s| *s >= 1).unwrap_or(1)
}

pub fn validate_plan_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Please enter a plan name".into());
    }
    Ok(name.to_string())
}

/// Where "add today's meal" puts the entry.
#[derive(Debug, Clone, PartialEq)]
pub enum TodayPlan {
    Existing(MealPlan),
    Create {
        name: String,
        start: Date,
        end: Date,
    },
}

/// `candidate` is the user's first plan starting on or after this week's Sunday.
/// It is reused only when it covers `today`; otherwise a plan for the current week is due.
pub fn plan_for_today(candidate: Option<MealPlan>, today: Date) -> TodayPlan {
    match candidate.filter(|p| p.contains(today)) {
        Some(plan) => TodayPlan::Existing(plan),
        None => {
            let (start, end) = plan_window(start_of_week(today));
            TodayPlan::Create {
                name: weekly_plan_name(start),
                start,
                end,
            }
        }
    }
}

pub fn validate_entry_date(plan: &MealPlan, meal_date: Date) -> Result<(), String> {
    if !plan.contains(meal_date) {
        return Err(format!(
            "Date must be between {} and {}",
            plan.start_date, plan.end_date
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    #[test]
    fn week_starts_on_sunday() {
        // 2024-06-05 is a Wednesday
        assert_eq!(start_of_week(date!(2024 - 06 - 05)), date!(2024 - 06 - 02));
        assert_eq!(start_of_week(date!(2024 - 06 - 02)), date!(2024 - 06 - 02));
        assert_eq!(start_of_week(date!(2024 - 06 - 08)), date!(2024 - 06 - 02));
    }

    #[test]
    fn plan_window_spans_seven_days() {
        let (start, end) = plan_window(date!(2024 - 12 - 29));
        assert_eq!(start, date!(2024 - 12 - 29));
        assert_eq!(end, date!(2025 - 01 - 04));
    }

    #[test]
    fn weekly_name_uses_iso_date() {
        assert_eq!(weekly_plan_name(date!(2024 - 06 - 02)), "Weekly Plan - 2024-06-02");
    }

    #[test]
    fn servings_fallback() {
        assert_eq!(normalize_servings(None), 1);
        assert_eq!(normalize_servings(Some(0)), 1);
        assert_eq!(normalize_servings(Some(-3)), 1);
        assert_eq!(normalize_servings(Some(4)), 4);
    }

    #[test]
    fn plan_name_is_trimmed_and_required() {
        assert_eq!(validate_plan_name("  Week 1 ").unwrap(), "Week 1");
        assert!(validate_plan_name("   ").is_err());
    }

    fn plan(start: Date, end: Date) -> MealPlan {
        MealPlan {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Week".into(),
            start_date: start,
            end_date: end,
            created_at: datetime!(2024-06-01 0:00 UTC),
        }
    }

    #[test]
    fn today_reuses_plan_covering_today() {
        let p = plan(date!(2024 - 06 - 02), date!(2024 - 06 - 08));
        let got = plan_for_today(Some(p.clone()), date!(2024 - 06 - 05));
        assert_eq!(got, TodayPlan::Existing(p));
    }

    #[test]
    fn today_creates_weekly_plan_when_none_exists() {
        let got = plan_for_today(None, date!(2024 - 06 - 05));
        assert_eq!(
            got,
            TodayPlan::Create {
                name: "Weekly Plan - 2024-06-02".into(),
                start: date!(2024 - 06 - 02),
                end: date!(2024 - 06 - 08),
            }
        );
    }

    #[test]
    fn today_ignores_plan_starting_after_today() {
        // starts on/after Sunday but not yet running on Wednesday
        let later = plan(date!(2024 - 06 - 07), date!(2024 - 06 - 13));
        match plan_for_today(Some(later), date!(2024 - 06 - 05)) {
            TodayPlan::Create { name, start, end } => {
                assert_eq!(name, "Weekly Plan - 2024-06-02");
                assert_eq!(start, date!(2024 - 06 - 02));
                assert_eq!(end, date!(2024 - 06 - 08));
            }
            other => panic!("expected a new plan, got {other:?}"),
        }
    }

    #[test]
    fn today_on_sunday_starts_that_day() {
        match plan_for_today(None, date!(2024 - 06 - 09)) {
            TodayPlan::Create { start, .. } => assert_eq!(start, date!(2024 - 06 - 09)),
            other => panic!("expected a new plan, got {other:?}"),
        }
    }

    #[test]
    fn entry_date_must_be_inside_plan() {
        let plan = plan(date!(2024 - 06 - 02), date!(2024 - 06 - 08));
        assert!(validate_entry_date(&plan, date!(2024 - 06 - 08)).is_ok());
        assert!(validate_entry_date(&plan, date!(2024 - 06 - 09)).is_err());
    }
}

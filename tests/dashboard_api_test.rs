// ==========================================
// DashboardApi 集成测试
// ==========================================
// 测试目标: 月累计产量/成本/出成率及风险分档
// ==========================================


use chrono::{Datelike, Duration, NaiveDate, Utc};
use food_production_ops::domain::types::BatchStatus;
use food_production_ops::api::ConvertBatchRequest;
use food_production_ops::config::config_keys;
use food_production_ops::domain::types::DamageType;
use food_production_ops::engine::{DamageRequest, YieldRiskCounts};
use test_helpers::{create_batch, insert_test_config, setup_test_env, TEST_ACTOR};

fn convert(bag_count: u32) -> ConvertBatchRequest {
    ConvertBatchRequest {
        bag_count,
        product_ref: "Dried Mango 4oz".to_string(),
    }
}

#[test]
fn test_mtd_summary_empty_month() {
    let (_temp_file, _db_path, env) = setup_test_env();

    let today = Utc::now().date_naive();
    let summary = env.dashboard_api.get_mtd_summary(today).unwrap();

    assert_eq!(summary.month_start, today.with_day(1).unwrap());
    assert_eq!(summary.as_of, today);
    assert_eq!(summary.summary.batch_count, 0);
    assert_eq!(summary.summary.mtd_throughput_lbs, 0.0);
    assert_eq!(summary.summary.mtd_cost, 0.0);
    assert_eq!(summary.summary.cost_per_lb_blended, None);
}

#[test]
fn test_mtd_summary_rollup() {
    let (_temp_file, _db_path, env) = setup_test_env();
    {
        let conn = env.conn.lock().unwrap();
        insert_test_config(&conn).unwrap();
    }

    let good = create_batch(&env, 45.5, Some(8.50));
    let critical = create_batch(&env, 20.0, Some(4.00));
    let damaged = create_batch(&env, 34.5, Some(2.00));
    create_batch(&env, 10.0, Some(1.00));

    env.batch_api
        .convert_batch(&good.batch_id, convert(27), None, TEST_ACTOR)
        .unwrap();
    env.batch_api
        .convert_batch(&critical.batch_id, convert(5), None, TEST_ACTOR)
        .unwrap();
    env.batch_api
        .record_damage(
            &damaged.batch_id,
            DamageRequest {
                damage_type: DamageType::Partial,
                weight_lbs: Some(4.5),
                reason: "pests".to_string(),
            },
            None,
            TEST_ACTOR,
        )
        .unwrap();

    let today = Utc::now().date_naive();
    let summary = env.dashboard_api.get_mtd_summary(today).unwrap().summary;

    // 45.5 + 20 + 30 + 10
    assert_eq!(summary.batch_count, 4);
    assert!((summary.mtd_throughput_lbs - 105.5).abs() < 1e-9);
    // 386.75 + 80 + 60 + 10
    assert!((summary.mtd_cost - 536.75).abs() < 1e-9);
    // (59 + 25) / 2
    assert!((summary.avg_yield_pct - 42.0).abs() < 1e-9);
    assert!((summary.cost_per_lb_blended.unwrap() - 536.75 / 105.5).abs() < 1e-9);
    assert_eq!(
        summary.yield_risk_counts,
        YieldRiskCounts {
            good: 1,
            warning: 0,
            critical: 1,
            unknown: 2,
        }
    );
}

#[test]
fn test_mtd_summary_respects_configured_thresholds() {
    let (_temp_file, _db_path, env) = setup_test_env();
    env.config_manager
        .set_global_config_value(config_keys::YIELD_GOOD_THRESHOLD_PCT, "60")
        .unwrap();
    env.config_manager
        .set_global_config_value(config_keys::YIELD_WARNING_THRESHOLD_PCT, "50")
        .unwrap();

    let batch = create_batch(&env, 45.5, Some(8.50));
    env.batch_api
        .convert_batch(&batch.batch_id, convert(27), None, TEST_ACTOR)
        .unwrap();

    let summary = env
        .dashboard_api
        .get_mtd_summary(Utc::now().date_naive())
        .unwrap()
        .summary;
    assert_eq!(summary.yield_risk_counts.warning, 1);
    assert_eq!(summary.yield_risk_counts.good, 0);
}

#[test]
fn test_mtd_summary_excludes_other_months() {
    let (_temp_file, _db_path, env) = setup_test_env();
    let batch = create_batch(&env, 45.5, Some(8.50));

    // 将批次挪到上个月
    let last_month = Utc::now().date_naive().with_day(1).unwrap() - Duration::days(1);
    {
        let conn = env.conn.lock().unwrap();
        conn.execute(
            "UPDATE batch SET created_at = ?1 WHERE batch_id = ?2",
            rusqlite::params![format!("{}T12:00:00.000000Z", last_month), batch.batch_id],
        )
        .unwrap();
    }

    let this_month = env
        .dashboard_api
        .get_mtd_summary(Utc::now().date_naive())
        .unwrap();
    assert_eq!(this_month.summary.batch_count, 0);

    let previous = env.dashboard_api.get_mtd_summary(last_month).unwrap();
    assert_eq!(previous.summary.batch_count, 1);
    assert!((previous.summary.mtd_cost - 386.75).abs() < 1e-9);

    // 截止日早于创建日时不计入
    let before = NaiveDate::from_ymd_opt(last_month.year(), last_month.month(), 1).unwrap();
    if before < last_month {
        let early = env.dashboard_api.get_mtd_summary(before).unwrap();
        assert_eq!(early.summary.batch_count, 0);
    }
}

#[test]
fn test_mtd_summary_damage_reduces_totals_consistently() {
    let (_temp_file, _db_path, env) = setup_test_env();
    let nearly_all = create_batch(&env, 45.5, Some(8.50));
    let all = create_batch(&env, 45.5, Some(8.50));

    let damage = |batch_id: &str, weight: f64| {
        env.batch_api
            .record_damage(
                batch_id,
                DamageRequest {
                    damage_type: DamageType::Partial,
                    weight_lbs: Some(weight),
                    reason: "flood".to_string(),
                },
                None,
                TEST_ACTOR,
            )
            .unwrap()
    };

    let partial = damage(&nearly_all.batch_id, 45.4);
    assert_eq!(partial.status, BatchStatus::PartialDamaged);
    let full = damage(&all.batch_id, 45.5);
    assert_eq!(full.status, BatchStatus::Damaged);
    assert_eq!(full.raw_weight_lbs, 0.0);

    // 剩余 0.1 lbs 的批次贡献 0.85，整批损耗的批次贡献 0
    let summary = env
        .dashboard_api
        .get_mtd_summary(Utc::now().date_naive())
        .unwrap()
        .summary;
    assert_eq!(summary.batch_count, 2);
    assert!((summary.mtd_throughput_lbs - 0.1).abs() < 1e-9);
    assert!((summary.mtd_cost - 0.85).abs() < 1e-9);
}

#[test]
fn test_mtd_summary_month_boundary_in_utc() {
    let (_temp_file, _db_path, env) = setup_test_env();
    let batch = create_batch(&env, 45.5, Some(8.50));

    // 2026-10-31 22:00 (UTC-5) 即 2026-11-01 03:00 UTC
    {
        let conn = env.conn.lock().unwrap();
        conn.execute(
            "UPDATE batch SET created_at = ?1 WHERE batch_id = ?2",
            rusqlite::params!["2026-11-01T03:00:00.000000Z", batch.batch_id],
        )
        .unwrap();
    }

    let october = env
        .dashboard_api
        .get_mtd_summary(NaiveDate::from_ymd_opt(2026, 10, 31).unwrap())
        .unwrap();
    assert_eq!(october.summary.batch_count, 0);

    let november = env
        .dashboard_api
        .get_mtd_summary(NaiveDate::from_ymd_opt(2026, 11, 1).unwrap())
        .unwrap();
    assert_eq!(november.month_start, NaiveDate::from_ymd_opt(2026, 11, 1).unwrap());
    assert_eq!(november.summary.batch_count, 1);
    assert!((november.summary.mtd_cost - 386.75).abs() < 1e-9);
}

// ==========================================
// 看板 API 集成测试
// ==========================================
// 职责: 验证工序吞吐统计与库存汇总的口径
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod dashboard_api_test {
    use stone_mes::api::{CreateJobParams, UpdateJobParams};
    use stone_mes::domain::types::{JobStatus, Stage};

    use crate::test_helpers::{at, cutting_measurement, seed_block, seed_stand, setup_test_env};

    #[test]
    fn test_empty_database_yields_zero_rates() {
        let env = setup_test_env();

        let analytics = env.dashboard_api.get_stage_analytics().unwrap();
        assert_eq!(analytics.stages.len(), 5);
        for stat in &analytics.stages {
            assert_eq!(stat.total_jobs, 0);
            assert_eq!(stat.completion_rate, 0.0);
            assert!(stat.average_processing_minutes.is_none());
        }
        assert_eq!(analytics.summary.total_active_jobs, 0);
        assert_eq!(analytics.summary.overall_completion_rate, 0.0);

        let inventory = env.dashboard_api.get_inventory_summary().unwrap();
        assert_eq!(inventory.total_area_sqft, 0.0);
        assert_eq!(inventory.occupied_stands, 0);
        assert!(inventory.quality_distribution.is_empty());
    }

    #[test]
    fn test_stage_analytics_counts_and_rates() {
        let env = setup_test_env();
        seed_block(&env, "B1");
        seed_block(&env, "B2");

        // B1: 切割完成（90 分钟）
        let job = env
            .production_api
            .create_job(CreateJobParams {
                block_id: "B1".to_string(),
                stage: Stage::Cutting,
                start_time: Some(at(0)),
                measurement: Some(cutting_measurement(100.0)),
                comment: None,
            })
            .unwrap();
        env.production_api
            .update_job(
                &job.job_id,
                UpdateJobParams {
                    status: Some(JobStatus::Completed),
                    end_time: Some(at(90)),
                    ..Default::default()
                },
            )
            .unwrap();

        // B2: 切割进行中
        env.production_api
            .create_job(CreateJobParams {
                block_id: "B2".to_string(),
                stage: Stage::Cutting,
                start_time: Some(at(0)),
                measurement: None,
                comment: None,
            })
            .unwrap();

        // B1: 磨抛进行中
        env.production_api
            .create_job(CreateJobParams {
                block_id: "B1".to_string(),
                stage: Stage::Grinding,
                start_time: Some(at(95)),
                measurement: None,
                comment: None,
            })
            .unwrap();

        let analytics = env.dashboard_api.get_stage_analytics().unwrap();

        let cutting = analytics
            .stages
            .iter()
            .find(|s| s.stage == Stage::Cutting)
            .unwrap();
        assert_eq!(cutting.total_jobs, 2);
        assert_eq!(cutting.completed_jobs, 1);
        assert_eq!(cutting.in_progress_jobs, 1);
        assert!((cutting.completion_rate - 0.5).abs() < 1e-9);
        assert_eq!(cutting.average_processing_minutes, Some(90.0));

        let grinding = analytics
            .stages
            .iter()
            .find(|s| s.stage == Stage::Grinding)
            .unwrap();
        assert_eq!(grinding.total_jobs, 1);
        assert_eq!(grinding.in_progress_jobs, 1);

        assert_eq!(analytics.summary.total_active_jobs, 2);
        assert_eq!(analytics.summary.total_completed_jobs, 1);
        // 等权平均: (0.5 + 0 + 0 + 0 + 0) / 5
        assert!((analytics.summary.overall_completion_rate - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_inventory_summary_area_and_distribution() {
        let env = setup_test_env();
        seed_block(&env, "B1"); // 120in × 72in → 10ft × 6ft
        seed_stand(&env, "A-01", 1, 100);
        seed_stand(&env, "A-02", 2, 100);

        env.inventory_api
            .check_in_finished_goods("A-01", "B1", Some("一级".to_string()), 10)
            .unwrap();
        let good = env
            .inventory_api
            .check_in_finished_goods("A-01", "B1", Some("二级".to_string()), 4)
            .unwrap();

        let summary = env.dashboard_api.get_inventory_summary().unwrap();
        // 10ft × 6ft × 14 板 = 840 sqft
        assert!((summary.total_area_sqft - 840.0).abs() < 1e-6);
        assert_eq!(summary.occupied_stands, 1);
        assert_eq!(summary.total_stands, 2);
        assert_eq!(summary.quality_distribution.get("一级"), Some(&10));
        assert_eq!(summary.quality_distribution.get("二级"), Some(&4));

        // 全部出库后该批退出汇总
        env.inventory_api.ship_goods(&good.good_id, 4, None).unwrap();
        let summary = env.dashboard_api.get_inventory_summary().unwrap();
        assert!((summary.total_area_sqft - 600.0).abs() < 1e-6);
        assert_eq!(summary.quality_distribution.get("二级"), None);
    }
}

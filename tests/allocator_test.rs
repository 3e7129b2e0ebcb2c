// ==========================================
// 货架容量分配器集成测试
// ==========================================
// 职责: 验证容量上限、库存递减、出库历史与荒料完结在真实数据库上的行为
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod allocator_test {
    use stone_mes::api::{ApiError, CreateJobParams, UpdateJobParams};
    use stone_mes::domain::types::{BlockStatus, JobStatus, Stage};

    use crate::test_helpers::{
        at, cutting_measurement, polishing_measurement, seed_block, seed_stand, setup_test_env,
        TestEnv,
    };

    // ==========================================
    // 测试辅助函数
    // ==========================================

    /// 把荒料推进到"抛光进行中"（切割完成、磨抛跳过）
    fn advance_to_polishing(env: &TestEnv, block_id: &str) -> String {
        let cutting = env
            .production_api
            .create_job(CreateJobParams {
                block_id: block_id.to_string(),
                stage: Stage::Cutting,
                start_time: Some(at(0)),
                measurement: Some(cutting_measurement(120.5)),
                comment: None,
            })
            .unwrap();
        env.production_api
            .update_job(
                &cutting.job_id,
                UpdateJobParams {
                    status: Some(JobStatus::Completed),
                    end_time: Some(at(90)),
                    ..Default::default()
                },
            )
            .unwrap();

        let grinding = env
            .production_api
            .create_job(CreateJobParams {
                block_id: block_id.to_string(),
                stage: Stage::Grinding,
                start_time: None,
                measurement: None,
                comment: None,
            })
            .unwrap();
        env.production_api
            .update_job(
                &grinding.job_id,
                UpdateJobParams {
                    status: Some(JobStatus::Skipped),
                    comment: Some("免磨".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let polishing = env
            .production_api
            .create_job(CreateJobParams {
                block_id: block_id.to_string(),
                stage: Stage::Polishing,
                start_time: Some(at(100)),
                measurement: Some(polishing_measurement()),
                comment: None,
            })
            .unwrap();
        polishing.job_id
    }

    // ==========================================
    // 容量上限
    // ==========================================

    #[test]
    fn test_capacity_exceeded_rejects_and_keeps_occupancy() {
        // 场景: 容量 200 的货架已占 190，再入库 15 → 拒绝且占用不变
        let env = setup_test_env();
        seed_block(&env, "B1");
        seed_stand(&env, "A-01", 1, 200);

        env.inventory_api
            .check_in_finished_goods("A-01", "B1", Some("一级".to_string()), 190)
            .unwrap();
        assert_eq!(env.inventory_api.get_occupancy("A-01").unwrap(), 190);

        let err = env
            .inventory_api
            .check_in_finished_goods("A-01", "B1", Some("一级".to_string()), 15)
            .unwrap_err();

        match err {
            ApiError::CapacityExceeded {
                current,
                max,
                requested,
                ..
            } => {
                assert_eq!(current, 190);
                assert_eq!(max, 200);
                assert_eq!(requested, 15);
            }
            other => panic!("意外的错误类型: {other:?}"),
        }

        // 占用保持 190，恰好填满仍可入
        assert_eq!(env.inventory_api.get_occupancy("A-01").unwrap(), 190);
        env.inventory_api
            .check_in_finished_goods("A-01", "B1", Some("一级".to_string()), 10)
            .unwrap();
        assert_eq!(env.inventory_api.get_occupancy("A-01").unwrap(), 200);
    }

    #[test]
    fn test_occupancy_is_derived_per_stand() {
        let env = setup_test_env();
        seed_block(&env, "B1");
        seed_stand(&env, "A-01", 1, 100);
        seed_stand(&env, "A-02", 2, 100);

        env.inventory_api
            .check_in_finished_goods("A-01", "B1", None, 30)
            .unwrap();
        env.inventory_api
            .check_in_finished_goods("A-02", "B1", None, 50)
            .unwrap();

        assert_eq!(env.inventory_api.get_occupancy("A-01").unwrap(), 30);
        assert_eq!(env.inventory_api.get_occupancy("A-02").unwrap(), 50);

        let stands = env.inventory_api.list_stands().unwrap();
        let a01 = stands.iter().find(|s| s.stand_id == "A-01").unwrap();
        assert_eq!(a01.occupancy, 30);
        assert_eq!(a01.max_capacity, 100);
    }

    // ==========================================
    // 出库与库存
    // ==========================================

    #[test]
    fn test_ship_decrements_and_records_history() {
        let env = setup_test_env();
        seed_block(&env, "B1");
        seed_stand(&env, "A-01", 1, 100);

        let good = env
            .inventory_api
            .check_in_finished_goods("A-01", "B1", Some("一级".to_string()), 20)
            .unwrap();

        env.inventory_api
            .ship_goods(&good.good_id, 8, Some("顺达物流".to_string()))
            .unwrap();
        env.inventory_api
            .ship_goods(&good.good_id, 5, Some("顺达物流".to_string()))
            .unwrap();

        assert_eq!(env.inventory_api.get_occupancy("A-01").unwrap(), 7);

        let shipments = env.inventory_api.list_shipments(&good.good_id).unwrap();
        assert_eq!(shipments.len(), 2);
        assert_eq!(shipments.iter().map(|s| s.slabs_shipped).sum::<i64>(), 13);
    }

    #[test]
    fn test_insufficient_stock_rejects_overship() {
        let env = setup_test_env();
        seed_block(&env, "B1");
        seed_stand(&env, "A-01", 1, 100);

        let good = env
            .inventory_api
            .check_in_finished_goods("A-01", "B1", None, 10)
            .unwrap();

        let err = env
            .inventory_api
            .ship_goods(&good.good_id, 11, None)
            .unwrap_err();

        match err {
            ApiError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 10);
                assert_eq!(requested, 11);
            }
            other => panic!("意外的错误类型: {other:?}"),
        }

        // 库存未动
        assert_eq!(env.inventory_api.get_occupancy("A-01").unwrap(), 10);
    }

    #[test]
    fn test_shipped_out_goods_leave_occupancy() {
        // 剩余为 0 的记录逻辑移除: 不计占用、货架可复用，但行保留供追溯
        let env = setup_test_env();
        seed_block(&env, "B1");
        seed_stand(&env, "A-01", 1, 50);

        let good = env
            .inventory_api
            .check_in_finished_goods("A-01", "B1", None, 50)
            .unwrap();
        env.inventory_api.ship_goods(&good.good_id, 50, None).unwrap();

        assert_eq!(env.inventory_api.get_occupancy("A-01").unwrap(), 0);
        env.inventory_api
            .check_in_finished_goods("A-01", "B1", None, 50)
            .unwrap();

        // 出库历史可追溯
        let shipments = env.inventory_api.list_shipments(&good.good_id).unwrap();
        assert_eq!(shipments.len(), 1);
    }

    // ==========================================
    // 抛光完工入库与荒料完结
    // ==========================================

    #[test]
    fn test_complete_polishing_checks_capacity_first() {
        // 容量不足时作业保持 IN_PROGRESS，不产生入库记录
        let env = setup_test_env();
        seed_block(&env, "B1");
        seed_block(&env, "B2");
        seed_stand(&env, "A-01", 1, 20);

        env.inventory_api
            .check_in_finished_goods("A-01", "B2", None, 18)
            .unwrap();

        let job_id = advance_to_polishing(&env, "B1");
        let err = env
            .production_api
            .complete_polishing(&job_id, 10, "A-01")
            .unwrap_err();
        assert!(matches!(err, ApiError::CapacityExceeded { .. }));

        let job = env.production_api.get_job(&job_id).unwrap();
        assert_eq!(job.status, JobStatus::InProgress);
        assert_eq!(env.inventory_api.get_occupancy("A-01").unwrap(), 18);
    }

    #[test]
    fn test_complete_polishing_derives_duration_and_slab_count() {
        // 完工时补齐 end_time 并重派生计量：时长、产出板数均落盘
        let env = setup_test_env();
        seed_block(&env, "B1");
        seed_stand(&env, "A-01", 1, 100);

        let job_id = advance_to_polishing(&env, "B1");

        // 开工时间改为 100 分钟前，完工时间由完工接口补齐为当前时刻
        env.production_api
            .update_job(
                &job_id,
                UpdateJobParams {
                    start_time: Some(chrono::Utc::now() - chrono::Duration::minutes(100)),
                    ..Default::default()
                },
            )
            .unwrap();

        let (job, _good) = env
            .production_api
            .complete_polishing(&job_id, 9, "A-01")
            .unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.end_time.is_some());
        assert_eq!(job.slab_count, Some(9));
        match job.measurement {
            Some(stone_mes::StageMeasurement::Polishing(m)) => {
                assert_eq!(m.polishing_minutes, Some(100));
                assert_eq!(m.slab_count, Some(9));
            }
            other => panic!("意外的计量负载: {other:?}"),
        }

        // 落盘值与返回值一致
        let persisted = env.production_api.get_job(&job_id).unwrap();
        match persisted.measurement {
            Some(stone_mes::StageMeasurement::Polishing(m)) => {
                assert_eq!(m.polishing_minutes, Some(100));
            }
            other => panic!("意外的计量负载: {other:?}"),
        }
    }

    #[test]
    fn test_revoke_check_in_removes_record_and_occupancy() {
        // 入库补偿原语：撤销后占用归零、记录不复存在
        let env = setup_test_env();
        seed_block(&env, "B1");
        seed_stand(&env, "A-01", 1, 100);

        let good = env
            .inventory_api
            .check_in_finished_goods("A-01", "B1", None, 25)
            .unwrap();
        assert_eq!(env.inventory_api.get_occupancy("A-01").unwrap(), 25);

        env.good_repo.revoke_check_in(&good.good_id).unwrap();

        assert_eq!(env.inventory_api.get_occupancy("A-01").unwrap(), 0);
        assert!(env.good_repo.find_by_id(&good.good_id).unwrap().is_none());
    }

    #[test]
    fn test_block_completed_after_all_goods_shipped() {
        let env = setup_test_env();
        seed_block(&env, "B1");
        seed_stand(&env, "A-01", 1, 100);

        let job_id = advance_to_polishing(&env, "B1");
        let (job, good) = env
            .production_api
            .complete_polishing(&job_id, 12, "A-01")
            .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.slab_count, Some(12));

        // 部分出库 → 荒料仍在加工完成态之前
        env.inventory_api.ship_goods(&good.good_id, 5, None).unwrap();
        let block = env.production_api.get_block("B1").unwrap();
        assert_eq!(block.status, BlockStatus::Processing);

        // 全部出库 → 荒料 COMPLETED
        env.inventory_api.ship_goods(&good.good_id, 7, None).unwrap();
        let block = env.production_api.get_block("B1").unwrap();
        assert_eq!(block.status, BlockStatus::Completed);
    }
}

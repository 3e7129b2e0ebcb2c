// ==========================================
// 石材加工生产追踪系统 - 看板 API
// ==========================================
// 职责: 管理看板只读汇总入口（工序吞吐、库存总览）
// 红线: 只读，按需重算，不做缓存
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::engine::analytics::{AnalyticsAggregator, InventorySummary, StageAnalytics};

/// 看板API
pub struct DashboardApi {
    aggregator: Arc<AnalyticsAggregator>,
}

impl DashboardApi {
    /// 创建新的DashboardApi实例
    pub fn new(aggregator: Arc<AnalyticsAggregator>) -> Self {
        Self { aggregator }
    }

    /// 各工序吞吐统计 + 全局汇总
    pub fn get_stage_analytics(&self) -> ApiResult<StageAnalytics> {
        Ok(self.aggregator.get_stage_analytics()?)
    }

    /// 库存汇总（总面积、货架占用、品级分布）
    pub fn get_inventory_summary(&self) -> ApiResult<InventorySummary> {
        Ok(self.aggregator.get_inventory_summary()?)
    }
}

// ==========================================
// 石材加工生产追踪系统 - 生产 API
// ==========================================
// 职责: 荒料进料登记、作业建单/更新/完工的对外入口
// 红线: API 层只做输入校验与错误转换，业务规则全部在引擎层
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::block::Block;
use crate::domain::inventory::FinishedGood;
use crate::domain::job::{ProductionJob, StageMeasurement};
use crate::domain::types::{BlockStatus, JobStatus, Stage};
use crate::engine::ledger::{CreateJobRequest, JobUpdate, ProductionLedger};
use crate::repository::block_repo::BlockRepository;

// ==========================================
// 请求结构
// ==========================================

/// 荒料进料登记请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterBlockRequest {
    pub block_id: String,
    pub length_in: Option<f64>,
    pub width_in: Option<f64>,
    pub height_in: Option<f64>,
    pub density: Option<f64>,
    pub gross_weight_t: Option<f64>,
    pub net_weight_t: Option<f64>,
    pub material_type: Option<String>,
    pub color: Option<String>,
    pub mine_name: Option<String>,
    pub vehicle_no: Option<String>,
    pub received_at: Option<DateTime<Utc>>, // 缺省取当前时间
}

/// 作业建单请求（API 层）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobParams {
    pub block_id: String,
    pub stage: Stage,
    pub start_time: Option<DateTime<Utc>>,
    pub measurement: Option<StageMeasurement>,
    pub comment: Option<String>,
}

/// 作业更新请求（API 层，None 字段保持原值）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateJobParams {
    pub status: Option<JobStatus>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub measurement: Option<StageMeasurement>,
    pub comment: Option<String>,
    pub slab_count: Option<i64>,
}

// ==========================================
// ProductionApi - 生产 API
// ==========================================

/// 生产API
///
/// 职责：
/// 1. 荒料进料登记与查询
/// 2. 作业建单/更新（经账本层执行状态机与计量派生）
/// 3. 抛光完工入库入口
pub struct ProductionApi {
    block_repo: Arc<BlockRepository>,
    ledger: Arc<ProductionLedger>,
}

impl ProductionApi {
    /// 创建新的ProductionApi实例
    pub fn new(block_repo: Arc<BlockRepository>, ledger: Arc<ProductionLedger>) -> Self {
        Self { block_repo, ledger }
    }

    // ==========================================
    // 荒料接口
    // ==========================================

    /// 荒料进料登记
    ///
    /// # 返回
    /// - Ok(Block): 登记的荒料（状态 IN_STOCK）
    /// - Err(InvalidInput): 编号为空
    /// - Err(ValidationError): 编号重复 / 尺寸为负
    pub fn register_block(&self, request: RegisterBlockRequest) -> ApiResult<Block> {
        let block_id = request.block_id.trim();
        if block_id.is_empty() {
            return Err(ApiError::InvalidInput("荒料编号不能为空".to_string()));
        }

        for (field, value) in [
            ("length_in", request.length_in),
            ("width_in", request.width_in),
            ("height_in", request.height_in),
            ("density", request.density),
            ("gross_weight_t", request.gross_weight_t),
            ("net_weight_t", request.net_weight_t),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(ApiError::InvalidInput(format!(
                        "字段 {field} 必须为非负数值: {v}"
                    )));
                }
            }
        }

        if self.block_repo.find_by_id(block_id)?.is_some() {
            return Err(ApiError::ValidationError(format!(
                "荒料编号已存在: {block_id}"
            )));
        }

        let mut block = Block::new(block_id, request.received_at.unwrap_or_else(Utc::now));
        block.length_in = request.length_in;
        block.width_in = request.width_in;
        block.height_in = request.height_in;
        block.density = request.density;
        block.gross_weight_t = request.gross_weight_t;
        block.net_weight_t = request.net_weight_t;
        block.material_type = request.material_type;
        block.color = request.color;
        block.mine_name = request.mine_name;
        block.vehicle_no = request.vehicle_no;

        self.block_repo.insert(&block)?;

        debug!(block_id = %block.block_id, "荒料进料登记");

        Ok(block)
    }

    /// 编辑荒料进料信息（尺寸/物料字段；状态由流水线推进，不在此修改）
    pub fn update_block(&self, request: RegisterBlockRequest) -> ApiResult<Block> {
        let block_id = request.block_id.trim();
        if block_id.is_empty() {
            return Err(ApiError::InvalidInput("荒料编号不能为空".to_string()));
        }

        let mut block = self
            .block_repo
            .find_by_id(block_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "Block".to_string(),
                id: block_id.to_string(),
            })?;

        block.length_in = request.length_in;
        block.width_in = request.width_in;
        block.height_in = request.height_in;
        block.density = request.density;
        block.gross_weight_t = request.gross_weight_t;
        block.net_weight_t = request.net_weight_t;
        block.material_type = request.material_type;
        block.color = request.color;
        block.mine_name = request.mine_name;
        block.vehicle_no = request.vehicle_no;
        if let Some(received_at) = request.received_at {
            block.received_at = received_at;
        }

        self.block_repo.update(&block)?;

        debug!(block_id = %block.block_id, "荒料进料信息已更新");

        Ok(block)
    }

    /// 查询全部荒料
    pub fn list_blocks(&self) -> ApiResult<Vec<Block>> {
        Ok(self.block_repo.list_all()?)
    }

    /// 按生命周期状态查询荒料
    pub fn list_blocks_by_status(&self, status: BlockStatus) -> ApiResult<Vec<Block>> {
        Ok(self.block_repo.list_by_status(status)?)
    }

    /// 按 ID 查询荒料
    pub fn get_block(&self, block_id: &str) -> ApiResult<Block> {
        self.block_repo
            .find_by_id(block_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "Block".to_string(),
                id: block_id.to_string(),
            })
    }

    /// 查询可进入指定工序的荒料列表
    pub fn list_eligible_blocks(&self, stage: Stage) -> ApiResult<Vec<Block>> {
        Ok(self.ledger.list_eligible_blocks(stage)?)
    }

    // ==========================================
    // 作业接口
    // ==========================================

    /// 创建作业
    pub fn create_job(&self, params: CreateJobParams) -> ApiResult<ProductionJob> {
        let block_id = params.block_id.trim();
        if block_id.is_empty() {
            return Err(ApiError::InvalidInput("荒料编号不能为空".to_string()));
        }

        let job = self.ledger.create_job(CreateJobRequest {
            block_id: block_id.to_string(),
            stage: params.stage,
            start_time: params.start_time,
            measurement: params.measurement,
            comment: params.comment,
        })?;

        Ok(job)
    }

    /// 更新作业（状态流转、时间、计量、备注）
    pub fn update_job(&self, job_id: &str, params: UpdateJobParams) -> ApiResult<ProductionJob> {
        if job_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("作业 ID 不能为空".to_string()));
        }

        let job = self.ledger.update_job(
            job_id,
            JobUpdate {
                status: params.status,
                start_time: params.start_time,
                end_time: params.end_time,
                measurement: params.measurement,
                comment: params.comment,
                slab_count: params.slab_count,
            },
        )?;

        Ok(job)
    }

    /// 抛光完工并入库
    ///
    /// 容量校验失败时作业保持原状态（错误附当前占用与上限）
    pub fn complete_polishing(
        &self,
        job_id: &str,
        slab_count: i64,
        stand_id: &str,
    ) -> ApiResult<(ProductionJob, FinishedGood)> {
        if job_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("作业 ID 不能为空".to_string()));
        }
        if stand_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("货架编号不能为空".to_string()));
        }

        Ok(self.ledger.complete_polishing(job_id, slab_count, stand_id)?)
    }

    /// 按 ID 查询作业
    pub fn get_job(&self, job_id: &str) -> ApiResult<ProductionJob> {
        self.ledger
            .get_job(job_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "ProductionJob".to_string(),
                id: job_id.to_string(),
            })
    }

    /// 查询荒料的作业历史（创建时间升序）
    pub fn list_jobs_for_block(&self, block_id: &str) -> ApiResult<Vec<ProductionJob>> {
        Ok(self.ledger.list_jobs_for_block(block_id)?)
    }
}

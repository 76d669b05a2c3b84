//! JS 执行器 - 基础设施层
//!
//! 持有 page 资源，只暴露"执行 JS"的能力

use anyhow::Result;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::AppError;

/// JS 执行器
///
/// 职责：
/// - 持有 Page 资源（chromiumoxide 的 Page 内部是 Arc，clone 开销很小）
/// - 暴露 eval() 能力
/// - 不认识题目 / 答案
#[derive(Clone)]
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(AppError::from)?;
        // 脚本返回 undefined 时没有值，按 null 处理
        let json_value = result.value().cloned().unwrap_or(JsonValue::Null);
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value).map_err(AppError::from)?;
        Ok(typed_value)
    }
}

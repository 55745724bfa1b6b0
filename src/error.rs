//! 行程规划错误分类

use std::time::Duration;
use thiserror::Error;

/// 行程规划过程中可能出现的错误
#[derive(Debug, Error)]
pub enum PlannerError {
    /// 搜索服务或模型服务不可达、返回错误或超时
    #[error("上游服务 {service} 调用失败: {message}")]
    UpstreamService { service: String, message: String },

    /// 配额用尽
    #[error("上游服务 {service} 触发限流 (retry after {retry_after:?})")]
    RateLimit {
        service: String,
        retry_after: Option<Duration>,
    },

    /// 服务返回了空内容或不可用的内容
    #[error("{source_name} 未返回可用内容")]
    EmptyResult { source_name: String },

    #[error("文档渲染失败: {0}")]
    Render(String),

    /// 缺少凭据等启动期配置问题
    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("无效的行程请求: {0}")]
    InvalidRequest(String),

    /// 流水线状态机被非法驱动
    #[error("流水线状态异常: {0}")]
    Pipeline(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl PlannerError {
    pub fn upstream(service: impl Into<String>, message: impl ToString) -> Self {
        PlannerError::UpstreamService {
            service: service.into(),
            message: message.to_string(),
        }
    }

    pub fn empty(source_name: impl Into<String>) -> Self {
        PlannerError::EmptyResult {
            source_name: source_name.into(),
        }
    }

    /// 是否值得由provider客户端重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlannerError::UpstreamService { .. } | PlannerError::RateLimit { .. }
        )
    }

    /// 限流错误携带的建议等待时间
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PlannerError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

pub type PlannerResult<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(PlannerError::upstream("search", "connection reset").is_retryable());
        assert!(
            PlannerError::RateLimit {
                service: "llm".to_string(),
                retry_after: None
            }
            .is_retryable()
        );

        assert!(!PlannerError::empty("DestinationAnalyst").is_retryable());
        assert!(!PlannerError::Configuration("missing key".to_string()).is_retryable());
        assert!(!PlannerError::Render("bad markup".to_string()).is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let err = PlannerError::RateLimit {
            service: "llm".to_string(),
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));
        assert_eq!(PlannerError::upstream("llm", "boom").retry_after(), None);
    }

    #[test]
    fn test_display_mentions_service() {
        let err = PlannerError::upstream("serper", "status 503");
        let message = err.to_string();
        assert!(message.contains("serper"));
        assert!(message.contains("503"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PlannerError = io.into();
        assert!(matches!(err, PlannerError::Io(_)));
    }
}

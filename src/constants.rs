/// 移动平均窗口大小（当前周期 + 前两个周期）
pub const MOVING_AVERAGE_WINDOW: usize = 3;

/// 汇总结果保留的小数位数
pub const SUMMARY_DECIMAL_PLACES: i32 = 2;

/// 未指定 granularity 时的默认粒度
pub const DEFAULT_GRANULARITY: &str = "day";

/// 请求体大小上限：64 KiB
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// 用户名长度范围（字符数）
pub const USERNAME_MIN_CHARS: usize = 2;
pub const USERNAME_MAX_CHARS: usize = 50;

/// 批量生成记录的默认数量
pub const DEFAULT_SEED_RECORDS: usize = 100;

/// 批量生成时时间戳分布的回溯天数
pub const SEED_LOOKBACK_DAYS: i64 = 30;

/// 滚动日志文件保留天数
pub const LOG_RETENTION_DAYS: usize = 30;

use anyhow::Result;
use std::path::PathBuf;

/// 默认模型路径（相对于工作目录）
pub const DEFAULT_MODEL_PATH: &str = "web_model/model.onnx";

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件路径
    pub model_path: PathBuf,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别 (0-3)
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,

    /// 最大并发连接数
    pub max_connections: usize,
}

impl Config {
    pub fn new(bind_addr: String, model_path: String, dev_mode: bool) -> Result<Self> {
        if model_path.trim().is_empty() {
            anyhow::bail!("Model path must not be empty");
        }

        let cpu_cores = num_cpus::get();

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            // base64 编码会膨胀约 4/3
            max_request_size: crate::image::loader::MAX_IMAGE_BYTES * 4 / 3 + 64 * 1024,
            max_connections: if dev_mode { 10 } else { 1000 },
        };

        Ok(Self {
            bind_addr,
            model_path: PathBuf::from(model_path),
            dev_mode,
            onnx_config,
            server_config,
        })
    }
}

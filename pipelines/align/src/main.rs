//! 脑切片批处理入口: 掩膜提取, 标记点配准与互信息打分.

mod loader;
mod runner;

fn main() -> std::io::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .expect("日志初始化失败");
    runner::run()
}

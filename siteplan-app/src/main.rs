use std::path::PathBuf;

use siteplan_engine::command::{CommandBus, CommandContext, CommandRequest};
use siteplan_engine::draw::level_primitives;
use siteplan_engine::scene::Scene;
use siteplan_io::{LevelLoader, LevelSaver, YamlFacade};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use siteplan_config::{AppConfig, ConfigError};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut level_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut rename: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--out" => {
                let Some(path) = args.next() else {
                    eprintln!("`--out` 需要提供输出文件路径");
                    std::process::exit(1);
                };
                output_path = Some(PathBuf::from(path));
            }
            "--name" => {
                let Some(name) = args.next() else {
                    eprintln!("`--name` 需要提供楼层名称");
                    std::process::exit(1);
                };
                rename = Some(name);
            }
            other if !other.starts_with('-') => {
                level_path = Some(PathBuf::from(other));
            }
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let config = load_configuration(config_override);
    init_logging(&config);
    info!("启动 siteplan 楼层编辑器");

    let facade = YamlFacade::with_roots(config.resources.drawing_roots.clone());
    let mut scene = Scene::new();

    match &level_path {
        Some(path) => match facade.load(path) {
            Ok(level) => scene.load_level(level),
            Err(err) => {
                error!(path = %path.display(), error = %err, "加载楼层失败");
                std::process::exit(1);
            }
        },
        None => {
            info!("未提供楼层文件，使用演示楼层");
            scene.populate_demo();
        }
    }

    if let Some(name) = rename {
        let level = scene.level();
        let (x_meters, y_meters) = (level.x_meters, level.y_meters);
        let drawing = level.drawing_filename.clone();
        scene.update_metadata(name, drawing, x_meters, y_meters);
    }

    print_summary(&scene);

    let bus = CommandBus::new();
    let mut context = CommandContext { scene: &mut scene };
    let focus = CommandRequest {
        name: "focus_level".to_string(),
        args: Vec::new(),
    };
    let response = bus.dispatch(&focus, &mut context);
    if let Some(message) = response.message {
        info!(success = response.success, "{message}");
    }

    let primitives = level_primitives(scene.level());
    println!("绘制图元共 {} 个", primitives.len());

    if let Some(path) = output_path {
        if let Err(err) = facade.save(scene.level(), &path) {
            error!(path = %path.display(), error = %err, "保存楼层失败");
            std::process::exit(1);
        }
        info!(path = %path.display(), "楼层已保存");
    }
}

fn print_summary(scene: &Scene) {
    let level = scene.level();
    println!("楼层: {}", level.name);
    println!(
        "  底图: {} ({} x {} px)",
        level.drawing_filename.as_deref().unwrap_or("<无>"),
        level.drawing_width,
        level.drawing_height
    );
    println!(
        "  比例尺: {:.6} 米/像素（{:.2} x {:.2} 米）",
        level.drawing_meters_per_pixel, level.x_meters, level.y_meters
    );
    println!(
        "  实体: {} 顶点 / {} 边 / {} 地板 / {} 模型",
        level.vertices.len(),
        level.edges.len(),
        level.polygons.len(),
        level.models.len()
    );
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}

use std::collections::HashMap;

use crate::scene::Scene;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub scene: &'a mut Scene,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(RecalibrateCommand);
        bus.register(ClearSelectionCommand);
        bus.register(DeleteSelectedCommand);
        bus.register(FocusLevelCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }
}

struct RecalibrateCommand;

impl CommandHandler for RecalibrateCommand {
    fn name(&self) -> &'static str {
        "recalibrate"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        context.scene.level_mut().calculate_scale();
        let scale = context.scene.level().drawing_meters_per_pixel;
        CommandResponse::ok(format!("比例尺已重估: {scale} 米/像素"))
    }
}

struct ClearSelectionCommand;

impl CommandHandler for ClearSelectionCommand {
    fn name(&self) -> &'static str {
        "clear_selection"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        context.scene.clear_selection();
        CommandResponse::ok("选中标记已清空")
    }
}

struct DeleteSelectedCommand;

impl CommandHandler for DeleteSelectedCommand {
    fn name(&self) -> &'static str {
        "delete_selected"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let removed = context.scene.delete_selected_edges();
        CommandResponse::ok(format!("已删除 {removed} 条边"))
    }
}

struct FocusLevelCommand;

impl CommandHandler for FocusLevelCommand {
    fn name(&self) -> &'static str {
        "focus_level"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        context.scene.focus_on_level();
        CommandResponse::ok("视口已聚焦楼层范围")
    }
}

#[cfg(test)]
mod tests {
    use siteplan_core::level::{EdgeType, ParamValue};

    use super::*;
    use crate::scene::Scene;

    fn request(name: &str) -> CommandRequest {
        CommandRequest {
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    #[test]
    fn delete_and_clear_commands_work() {
        let mut scene = Scene::new();
        scene.populate_demo();
        scene.select_edge(0).expect("select edge");

        let bus = CommandBus::new();
        let mut context = CommandContext { scene: &mut scene };

        let response = bus.dispatch(&request("delete_selected"), &mut context);
        assert!(response.success);
        assert_eq!(context.scene.level().edges.len(), 4);

        context.scene.select_vertex(0).expect("select vertex");
        let response = bus.dispatch(&request("clear_selection"), &mut context);
        assert!(response.success);
        assert_eq!(context.scene.selection_len(), 0);
    }

    #[test]
    fn recalibrate_command_updates_the_scale() {
        let mut scene = Scene::new();
        scene.populate_demo();
        // 直接改写测量边参数，再通过命令重估
        let measurement = scene
            .level_mut()
            .edges
            .iter_mut()
            .find(|e| e.edge_type == EdgeType::Measurement)
            .expect("demo has a measurement");
        measurement
            .params
            .insert("distance".to_string(), ParamValue::Double(30.0));

        let bus = CommandBus::new();
        let mut context = CommandContext { scene: &mut scene };
        let response = bus.dispatch(&request("recalibrate"), &mut context);
        assert!(response.success);
        assert!((context.scene.level().drawing_meters_per_pixel - 0.1).abs() < 1e-12);
    }

    #[test]
    fn focus_command_recenters_the_viewport() {
        let mut scene = Scene::new();
        scene.populate_demo();
        scene.set_viewport_center(siteplan_core::geometry::Point2::new(9999.0, 0.0));

        let bus = CommandBus::new();
        let mut context = CommandContext { scene: &mut scene };
        let response = bus.dispatch(&request("focus_level"), &mut context);
        assert!(response.success);
        assert!((context.scene.viewport().center.x() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let mut scene = Scene::new();
        let bus = CommandBus::new();
        let mut context = CommandContext { scene: &mut scene };
        let response = bus.dispatch(&request("explode"), &mut context);
        assert!(!response.success);
        assert!(response.message.unwrap().contains("explode"));
    }
}

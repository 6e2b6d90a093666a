pub mod command;
pub mod draw;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("vertex with index {0} not found")]
        VertexNotFound(usize),
        #[error("edge with index {0} not found")]
        EdgeNotFound(usize),
        #[error("polygon with index {0} not found")]
        PolygonNotFound(usize),
    }
}

pub mod scene {
    use siteplan_core::geometry::{Point2, Vector2};
    use siteplan_core::level::{
        DEFAULT_METERS_PER_PIXEL, Edge, EdgeType, Level, Model, ParamValue, Polygon,
    };
    use tracing::{debug, info};

    use crate::errors::EngineError;

    const DEFAULT_ZOOM: f64 = 1.0;
    const MIN_ZOOM: f64 = 0.01;
    const MAX_ZOOM: f64 = 1_000.0;

    /// 记录视口状态（中心点与缩放）。
    #[derive(Debug, Clone, Copy)]
    pub struct ViewportState {
        pub center: Point2,
        pub zoom: f64,
    }

    impl ViewportState {
        #[inline]
        fn clamp_zoom(value: f64) -> f64 {
            value.clamp(MIN_ZOOM, MAX_ZOOM)
        }
    }

    impl Default for ViewportState {
        fn default() -> Self {
            Self {
                center: Point2::new(0.0, 0.0),
                zoom: DEFAULT_ZOOM,
            }
        }
    }

    /// 引擎层负责维护 `Level` 和运行时状态（选中标记、视图设置等）。
    /// 所有会影响测量边集合的修改都在这里触发比例尺重估，保证
    /// `drawing_meters_per_pixel` 始终与当前测量边一致。
    #[derive(Debug)]
    pub struct Scene {
        level: Level,
        viewport: ViewportState,
    }

    impl Scene {
        pub fn new() -> Self {
            Self {
                level: Level::new("untitled"),
                viewport: ViewportState::default(),
            }
        }

        /// 使用现有楼层初始化场景。
        pub fn with_level(level: Level) -> Self {
            let mut scene = Self::new();
            scene.load_level(level);
            scene
        }

        /// 替换当前楼层并重置运行时状态。
        pub fn load_level(&mut self, level: Level) {
            self.level = level;
            self.viewport = ViewportState::default();
            if let Some(bounds) = self.level.bounds() {
                self.viewport.center = bounds.center();
            }
        }

        #[inline]
        pub fn level(&self) -> &Level {
            &self.level
        }

        #[inline]
        pub fn level_mut(&mut self) -> &mut Level {
            &mut self.level
        }

        /// 选中指定顶点。下标越界时返回错误。
        pub fn select_vertex(&mut self, idx: usize) -> Result<(), EngineError> {
            let vertex = self
                .level
                .vertices
                .get_mut(idx)
                .ok_or(EngineError::VertexNotFound(idx))?;
            vertex.selected = true;
            Ok(())
        }

        pub fn select_edge(&mut self, idx: usize) -> Result<(), EngineError> {
            let edge = self
                .level
                .edges
                .get_mut(idx)
                .ok_or(EngineError::EdgeNotFound(idx))?;
            edge.selected = true;
            Ok(())
        }

        pub fn select_polygon(&mut self, idx: usize) -> Result<(), EngineError> {
            let polygon = self
                .level
                .polygons
                .get_mut(idx)
                .ok_or(EngineError::PolygonNotFound(idx))?;
            polygon.selected = true;
            Ok(())
        }

        /// 取消选中指定边，返回之前是否处于选中状态。
        pub fn deselect_edge(&mut self, idx: usize) -> Result<bool, EngineError> {
            let edge = self
                .level
                .edges
                .get_mut(idx)
                .ok_or(EngineError::EdgeNotFound(idx))?;
            let was = edge.selected;
            edge.selected = false;
            Ok(was)
        }

        /// 清空全部实体的选中标记。
        pub fn clear_selection(&mut self) {
            for vertex in &mut self.level.vertices {
                vertex.selected = false;
            }
            for edge in &mut self.level.edges {
                edge.selected = false;
            }
            for polygon in &mut self.level.polygons {
                polygon.selected = false;
            }
        }

        /// 当前处于选中状态的实体总数。
        pub fn selection_len(&self) -> usize {
            self.level.vertices.iter().filter(|v| v.selected).count()
                + self.level.edges.iter().filter(|e| e.selected).count()
                + self.level.polygons.iter().filter(|p| p.selected).count()
        }

        /// 新增一条边。端点必须已存在；测量边入库后立即重估比例尺。
        pub fn add_edge(&mut self, edge: Edge) -> Result<usize, EngineError> {
            if edge.start_idx >= self.level.vertices.len() {
                return Err(EngineError::VertexNotFound(edge.start_idx));
            }
            if edge.end_idx >= self.level.vertices.len() {
                return Err(EngineError::VertexNotFound(edge.end_idx));
            }
            let is_measurement = edge.edge_type == EdgeType::Measurement;
            let idx = self.level.add_edge(edge);
            if is_measurement {
                self.level.calculate_scale();
            }
            Ok(idx)
        }

        /// 删除全部选中的边，返回删除数量。删除了测量边时重估比例尺。
        pub fn delete_selected_edges(&mut self) -> usize {
            let had_measurement = self
                .level
                .edges
                .iter()
                .any(|edge| edge.selected && edge.edge_type == EdgeType::Measurement);
            let removed = self.level.delete_selected_edges();
            if removed > 0 {
                debug!(removed, "已删除选中的边");
            }
            if had_measurement {
                self.level.calculate_scale();
            }
            removed
        }

        /// 套用元数据编辑结果。设置了底图文件名时显式米数失效，以像素
        /// 尺寸换算为准；随后总是重估比例尺。
        pub fn update_metadata(
            &mut self,
            name: impl Into<String>,
            drawing_filename: Option<String>,
            x_meters: f64,
            y_meters: f64,
        ) {
            self.level.name = name.into();
            if drawing_filename.is_some() {
                self.level.drawing_filename = drawing_filename;
                self.level.x_meters = 0.0;
                self.level.y_meters = 0.0;
            } else {
                self.level.drawing_filename = None;
                self.level.x_meters = x_meters;
                self.level.y_meters = y_meters;
                self.level.drawing_width = x_meters / DEFAULT_METERS_PER_PIXEL;
                self.level.drawing_height = y_meters / DEFAULT_METERS_PER_PIXEL;
            }
            self.level.calculate_scale();
            info!(name = self.level.name, "楼层元数据已更新");
        }

        #[inline]
        pub fn viewport(&self) -> ViewportState {
            self.viewport
        }

        #[inline]
        pub fn reset_viewport(&mut self) {
            self.viewport = ViewportState::default();
        }

        #[inline]
        pub fn set_viewport_center(&mut self, center: Point2) {
            self.viewport.center = center;
        }

        pub fn pan_viewport(&mut self, delta: Vector2) {
            self.viewport.center = self.viewport.center.translate(delta);
        }

        /// 设置缩放倍数（自动限制在合法范围内）。
        pub fn set_viewport_zoom(&mut self, zoom: f64) {
            self.viewport.zoom = ViewportState::clamp_zoom(zoom);
        }

        /// 按乘法因子调整缩放。
        pub fn scale_viewport_zoom(&mut self, factor: f64) {
            let current = self.viewport.zoom;
            let target = if factor.is_finite() {
                current * factor
            } else {
                current
            };
            self.set_viewport_zoom(target);
        }

        /// 把视口中心移到楼层范围的中点。
        pub fn focus_on_level(&mut self) {
            if let Some(bounds) = self.level.bounds() {
                self.viewport.center = bounds.center();
            }
        }

        /// 为 CLI / 快速验证填充一个小型示例楼层。
        pub fn populate_demo(&mut self) {
            let mut level = Level::new("demo");
            level.drawing_width = 400.0;
            level.drawing_height = 300.0;

            let a = level.add_vertex(50.0, 50.0);
            let b = level.add_vertex(350.0, 50.0);
            let c = level.add_vertex(350.0, 250.0);
            let d = level.add_vertex(50.0, 250.0);
            level.vertices[a].name = "entry".to_string();

            level.add_edge(Edge::new(a, b, EdgeType::Wall));
            level.add_edge(Edge::new(b, c, EdgeType::Wall));
            level.add_edge(
                Edge::new(a, d, EdgeType::Lane).with_param("bidirectional", ParamValue::Int(1)),
            );
            level.add_edge(
                Edge::new(a, b, EdgeType::Measurement)
                    .with_param("distance", ParamValue::Double(15.0)),
            );
            level.add_edge(
                Edge::new(c, d, EdgeType::Door)
                    .with_param("type", ParamValue::String("hinged".to_string())),
            );
            level.polygons.push(Polygon::floor(vec![a, b, c, d]));
            level.models.push(Model {
                model_name: "Shelf".to_string(),
                name: "shelf_1".to_string(),
                x: 200.0,
                y: 150.0,
                yaw: 0.0,
            });
            level.calculate_scale();

            debug!(
                vertices = level.vertices.len(),
                edges = level.edges.len(),
                "已创建演示楼层"
            );
            self.load_level(level);
        }
    }

    impl Default for Scene {
        fn default() -> Self {
            Self::new()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn demo_population_creates_entities() {
            let mut scene = Scene::new();
            scene.populate_demo();
            assert_eq!(scene.level().vertices.len(), 4);
            assert_eq!(scene.level().edges.len(), 5);
            assert_eq!(scene.level().polygons.len(), 1);
            assert_eq!(scene.level().models.len(), 1);
            // 一条 300px = 15m 的测量边
            assert!((scene.level().drawing_meters_per_pixel - 0.05).abs() < 1e-12);
        }

        #[test]
        fn selection_operations_validate_indices() {
            let mut scene = Scene::new();
            scene.populate_demo();

            assert_eq!(scene.selection_len(), 0);
            scene.select_vertex(0).expect("select vertex");
            scene.select_edge(1).expect("select edge");
            scene.select_polygon(0).expect("select polygon");
            assert_eq!(scene.selection_len(), 3);

            assert!(scene.deselect_edge(1).expect("deselect"));
            assert!(!scene.deselect_edge(1).expect("deselect twice"));
            assert_eq!(scene.selection_len(), 2);

            scene.clear_selection();
            assert_eq!(scene.selection_len(), 0);

            assert!(matches!(
                scene.select_vertex(99),
                Err(EngineError::VertexNotFound(99))
            ));
            assert!(matches!(
                scene.select_edge(99),
                Err(EngineError::EdgeNotFound(99))
            ));
            assert!(matches!(
                scene.select_polygon(99),
                Err(EngineError::PolygonNotFound(99))
            ));
        }

        #[test]
        fn deleting_a_measurement_recalibrates() {
            let mut scene = Scene::new();
            let mut level = Level::new("L1");
            level.add_vertex(0.0, 0.0);
            level.add_vertex(100.0, 0.0);
            level.add_edge(
                Edge::new(0, 1, EdgeType::Measurement)
                    .with_param("distance", ParamValue::Double(20.0)),
            );
            level.calculate_scale();
            scene.load_level(level);
            assert!((scene.level().drawing_meters_per_pixel - 0.2).abs() < 1e-12);

            scene.select_edge(0).expect("select measurement");
            assert_eq!(scene.delete_selected_edges(), 1);
            assert!(
                (scene.level().drawing_meters_per_pixel - DEFAULT_METERS_PER_PIXEL).abs() < 1e-12
            );
        }

        #[test]
        fn adding_a_measurement_recalibrates() {
            let mut scene = Scene::new();
            let mut level = Level::new("L1");
            level.add_vertex(0.0, 0.0);
            level.add_vertex(100.0, 0.0);
            scene.load_level(level);

            scene
                .add_edge(
                    Edge::new(0, 1, EdgeType::Measurement)
                        .with_param("distance", ParamValue::Double(20.0)),
                )
                .expect("add measurement");
            assert!((scene.level().drawing_meters_per_pixel - 0.2).abs() < 1e-12);

            let err = scene.add_edge(Edge::new(0, 7, EdgeType::Wall)).unwrap_err();
            assert!(matches!(err, EngineError::VertexNotFound(7)));
        }

        #[test]
        fn metadata_update_zeroes_explicit_dims_when_drawing_set() {
            let mut scene = Scene::new();
            let mut level = Level::new("L1");
            level.drawing_width = 800.0;
            level.drawing_height = 600.0;
            scene.load_level(level);

            scene.update_metadata("floor_2", Some("floor_2.png".to_string()), 40.0, 20.0);
            assert_eq!(scene.level().name, "floor_2");
            assert_eq!(scene.level().drawing_filename.as_deref(), Some("floor_2.png"));
            // 像素尺寸与默认比例尺换算出米数，显式输入被丢弃
            assert!((scene.level().x_meters - 40.0).abs() < 1e-9);
            assert!((scene.level().y_meters - 30.0).abs() < 1e-9);

            scene.update_metadata("floor_2", None, 12.0, 6.0);
            assert!(scene.level().drawing_filename.is_none());
            assert!((scene.level().x_meters - 12.0).abs() < 1e-9);
            assert!((scene.level().drawing_width - 240.0).abs() < 1e-9);
        }

        #[test]
        fn viewport_state_clamps_zoom() {
            let mut scene = Scene::new();
            let default = scene.viewport();
            assert!((default.zoom - 1.0).abs() < f64::EPSILON);

            scene.set_viewport_center(Point2::new(10.0, -5.0));
            scene.pan_viewport(Vector2::new(5.0, 5.0));
            assert_eq!(scene.viewport().center.x(), 15.0);
            assert_eq!(scene.viewport().center.y(), 0.0);

            scene.set_viewport_zoom(0.0001);
            assert!((scene.viewport().zoom - MIN_ZOOM).abs() < f64::EPSILON);
            scene.set_viewport_zoom(10_000.0);
            assert!((scene.viewport().zoom - MAX_ZOOM).abs() < f64::EPSILON);

            scene.set_viewport_zoom(2.0);
            scene.scale_viewport_zoom(0.5);
            assert!((scene.viewport().zoom - 1.0).abs() < f64::EPSILON);

            scene.reset_viewport();
            assert!((scene.viewport().zoom - 1.0).abs() < f64::EPSILON);
        }

        #[test]
        fn focus_on_level_recenters_viewport() {
            let mut scene = Scene::new();
            scene.populate_demo();
            scene.set_viewport_center(Point2::new(999.0, 999.0));
            scene.focus_on_level();
            let viewport = scene.viewport();
            assert!((viewport.center.x() - 200.0).abs() < 1e-9);
            assert!((viewport.center.y() - 150.0).abs() < 1e-9);
        }
    }
}

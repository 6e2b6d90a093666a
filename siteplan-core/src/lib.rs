pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，坐标单位为底图像素。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn midpoint(self, other: Point2) -> Point2 {
            Self((self.0 + other.0) * 0.5)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量，提供方向与长度运算。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn from_angle(angle: f64) -> Self {
            Self(DVec2::new(angle.cos(), angle.sin()))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn scale(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        /// 逆时针旋转 90° 的垂直向量。
        #[inline]
        pub fn perp(self) -> Self {
            Self(DVec2::new(-self.0.y, self.0.x))
        }

        /// 与 +x 轴的夹角（弧度，逆时针为正）。
        #[inline]
        pub fn angle(self) -> f64 {
            self.0.y.atan2(self.0.x)
        }

        #[inline]
        pub fn dot(self, other: Vector2) -> f64 {
            self.0.dot(other.0)
        }

        #[inline]
        pub fn normalize(self) -> Option<Self> {
            let len = self.0.length();
            if len <= f64::EPSILON {
                None
            } else {
                Some(Self(self.0 / len))
            }
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，用于估算楼层范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let center = (self.min.as_vec2() + self.max.as_vec2()) * 0.5;
            Point2::from_vec(center)
        }
    }

    /// 点到线段的最短距离及其投影点。投影参数 t 被钳制到 [0, 1]，
    /// 永远不会外推到线段之外；退化线段（a == b）按到点 a 的距离处理。
    pub fn point_segment_distance(p: Point2, a: Point2, b: Point2) -> (f64, Point2) {
        let segment = Vector2::from_points(a, b);
        let length_squared = segment.length_squared();
        if length_squared <= f64::EPSILON {
            return (p.distance(a), a);
        }
        let t = (Vector2::from_points(a, p).dot(segment) / length_squared).clamp(0.0, 1.0);
        let projected = a.translate(segment.scale(t));
        (p.distance(projected), projected)
    }

    /// 门扇摆动包络的固定采样点数（9 段），设计常量，不可配置。
    pub const DOOR_SWING_STEPS: usize = 10;

    /// 铰链门摆动包络：铰链 → 关门位置的门尖 → 10 个等角采样点 → 铰链。
    /// 角度遵循数学正方向（+x 为 0，逆时针为正）。
    pub fn door_swing_path(
        hinge: Point2,
        door_length: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Vec<Point2> {
        let mut path = Vec::with_capacity(DOOR_SWING_STEPS + 3);
        path.push(hinge);
        path.push(hinge.translate(Vector2::from_angle(start_angle).scale(door_length)));

        let angle_inc = (end_angle - start_angle) / (DOOR_SWING_STEPS as f64 - 1.0);
        for i in 0..DOOR_SWING_STEPS {
            let a = start_angle + i as f64 * angle_inc;
            path.push(hinge.translate(Vector2::from_angle(a).scale(door_length)));
        }

        path.push(hinge);
        path
    }

    /// 滑动门包络：静止门线，以及门板滑入方向上的薄矩形（通常在墙体内）。
    /// `half_thickness` 为矩形半厚度（像素）。
    pub fn door_slide_path(
        anchor: Point2,
        door_length: f64,
        door_angle: f64,
        half_thickness: f64,
    ) -> [Vec<Point2>; 2] {
        let dir = Vector2::from_angle(door_angle);
        let side =
            Vector2::from_angle(door_angle + std::f64::consts::FRAC_PI_2).scale(half_thickness);
        let back = dir.scale(-door_length);

        let door_line = vec![anchor, anchor.translate(dir.scale(door_length))];

        let p1 = anchor.translate(side.scale(-1.0));
        let p2 = p1.translate(back);
        let p3 = anchor.translate(side).translate(back);
        let p4 = anchor.translate(side);
        let pocket = vec![p1, p2, p3, p4, p1];

        [door_line, pocket]
    }

    /// 车道方向指示箭头：以 `center` 为底、沿单位向量 `dir` 指向箭尖的
    /// 两条线段。传入反向的 `dir` 即可得到反向箭头。
    pub fn arrow_chevron(
        center: Point2,
        dir: Vector2,
        half_width: f64,
        length: f64,
    ) -> [(Point2, Point2); 2] {
        let side = dir.perp().scale(half_width);
        let tip = center.translate(dir.scale(length));
        let e1 = center.translate(side);
        let e2 = center.translate(side.scale(-1.0));
        [(e1, tip), (e2, tip)]
    }

    /// 以 `yaw` 为朝向的矩形四角，顺序为前左、前右、后右、后左。
    pub fn oriented_box(
        center: Point2,
        yaw: f64,
        half_length: f64,
        half_width: f64,
    ) -> [Point2; 4] {
        let forward = Vector2::from_angle(yaw).scale(half_length);
        let left = Vector2::from_angle(yaw).perp().scale(half_width);
        [
            center.translate(forward).translate(left),
            center.translate(forward).translate(left.scale(-1.0)),
            center
                .translate(forward.scale(-1.0))
                .translate(left.scale(-1.0)),
            center.translate(forward.scale(-1.0)).translate(left),
        ]
    }

}

pub mod level {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds2D, Point2, point_segment_distance};

    /// 无法从测量边估算比例尺时使用的默认值（米/像素）。
    pub const DEFAULT_METERS_PER_PIXEL: f64 = 0.05;

    /// 边上携带的异构参数值。固定的三种变体与持久化格式一一对应。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum ParamValue {
        String(String),
        Int(i64),
        Double(f64),
    }

    impl ParamValue {
        #[inline]
        pub fn as_str(&self) -> Option<&str> {
            match self {
                ParamValue::String(value) => Some(value),
                _ => None,
            }
        }

        #[inline]
        pub fn as_int(&self) -> Option<i64> {
            match self {
                ParamValue::Int(value) => Some(*value),
                _ => None,
            }
        }

        #[inline]
        pub fn as_double(&self) -> Option<f64> {
            match self {
                ParamValue::Double(value) => Some(*value),
                _ => None,
            }
        }
    }

    /// 顶点：底图像素坐标加可选名称。`selected` 是交互期覆盖状态，
    /// 不参与持久化。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Vertex {
        pub position: Point2,
        #[serde(default)]
        pub name: String,
        #[serde(skip)]
        pub selected: bool,
    }

    impl Vertex {
        pub fn new(x: f64, y: f64) -> Self {
            Self {
                position: Point2::new(x, y),
                name: String::new(),
                selected: false,
            }
        }

        pub fn named(x: f64, y: f64, name: impl Into<String>) -> Self {
            Self {
                position: Point2::new(x, y),
                name: name.into(),
                selected: false,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EdgeType {
        Lane,
        Wall,
        Measurement,
        Door,
    }

    /// 连接两个顶点的有类型边。顶点以下标弱引用 `Level::vertices`。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Edge {
        pub edge_type: EdgeType,
        pub start_idx: usize,
        pub end_idx: usize,
        #[serde(default)]
        pub params: BTreeMap<String, ParamValue>,
        #[serde(skip)]
        pub selected: bool,
    }

    impl Edge {
        pub fn new(start_idx: usize, end_idx: usize, edge_type: EdgeType) -> Self {
            Self {
                edge_type,
                start_idx,
                end_idx,
                params: BTreeMap::new(),
                selected: false,
            }
        }

        pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
            self.params.insert(name.into(), value);
            self
        }

        #[inline]
        pub fn param_str(&self, name: &str) -> Option<&str> {
            self.params.get(name).and_then(ParamValue::as_str)
        }

        #[inline]
        pub fn param_int(&self, name: &str) -> Option<i64> {
            self.params.get(name).and_then(ParamValue::as_int)
        }

        #[inline]
        pub fn param_double(&self, name: &str) -> Option<f64> {
            self.params.get(name).and_then(ParamValue::as_double)
        }

        /// 双向车道在两个方向上都绘制箭头。
        #[inline]
        pub fn is_bidirectional(&self) -> bool {
            self.param_int("bidirectional").is_some_and(|v| v != 0)
        }

        /// 车道所属导航图编号，决定渲染色相。
        #[inline]
        pub fn graph_idx(&self) -> i64 {
            self.param_int("graph_idx").unwrap_or(0)
        }

        /// 车道的行进朝向约束（`forward` 或 `backward`），无约束时为 None。
        #[inline]
        pub fn orientation(&self) -> Option<&str> {
            self.param_str("orientation")
        }

        /// 测量边的真实长度（米）。
        #[inline]
        pub fn distance_meters(&self) -> Option<f64> {
            self.param_double("distance")
        }

        #[inline]
        pub fn door_type(&self) -> Option<&str> {
            self.param_str("type")
        }

        /// 门的铰链端，缺省为 `start`。
        #[inline]
        pub fn motion_axis(&self) -> &str {
            self.param_str("motion_axis").unwrap_or("start")
        }

        #[inline]
        pub fn motion_degrees(&self) -> f64 {
            self.param_double("motion_degrees").unwrap_or(90.0)
        }

        #[inline]
        pub fn motion_direction(&self) -> i64 {
            self.param_int("motion_direction").unwrap_or(1)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PolygonType {
        Floor,
    }

    /// 闭合的顶点下标环（首尾相连），描述一块地板区域。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Polygon {
        pub polygon_type: PolygonType,
        pub vertices: Vec<usize>,
        #[serde(skip)]
        pub selected: bool,
    }

    impl Polygon {
        pub fn floor(vertices: Vec<usize>) -> Self {
            Self {
                polygon_type: PolygonType::Floor,
                vertices,
                selected: false,
            }
        }
    }

    /// 放置在楼层上的模型实例。与边、多边形相互独立。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Model {
        pub model_name: String,
        pub name: String,
        pub x: f64,
        pub y: f64,
        pub yaw: f64,
    }

    /// 楼层聚合根：底图与尺寸、比例尺状态，以及全部实体集合。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Level {
        pub name: String,
        pub drawing_filename: Option<String>,
        /// 底图像素尺寸。未加载底图且无法推算时保持为 0。
        pub drawing_width: f64,
        pub drawing_height: f64,
        /// 比例尺（米/像素），恒为正。
        pub drawing_meters_per_pixel: f64,
        pub x_meters: f64,
        pub y_meters: f64,
        pub elevation: f64,
        pub vertices: Vec<Vertex>,
        pub edges: Vec<Edge>,
        pub polygons: Vec<Polygon>,
        pub models: Vec<Model>,
    }

    impl Level {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                drawing_filename: None,
                drawing_width: 0.0,
                drawing_height: 0.0,
                drawing_meters_per_pixel: DEFAULT_METERS_PER_PIXEL,
                x_meters: 10.0,
                y_meters: 10.0,
                elevation: 0.0,
                vertices: Vec::new(),
                edges: Vec::new(),
                polygons: Vec::new(),
                models: Vec::new(),
            }
        }

        pub fn add_vertex(&mut self, x: f64, y: f64) -> usize {
            self.vertices.push(Vertex::new(x, y));
            self.vertices.len() - 1
        }

        pub fn add_edge(&mut self, edge: Edge) -> usize {
            self.edges.push(edge);
            self.edges.len() - 1
        }

        /// 边的两个端点坐标；任一下标越界时返回 None。
        pub fn edge_endpoints(&self, edge: &Edge) -> Option<(Point2, Point2)> {
            let start = self.vertices.get(edge.start_idx)?.position;
            let end = self.vertices.get(edge.end_idx)?.position;
            Some((start, end))
        }

        /// 用全部测量边重新估算比例尺，并同步以米计的楼层尺寸。
        ///
        /// 估算值取各测量边「真实米数 / 像素距离」的平均；没有可用的
        /// 测量边时回落到固定默认值，而不保留先前的估算结果。端点重合、
        /// 下标越界或缺少 `distance` 参数的测量边不计入平均。
        pub fn calculate_scale(&mut self) {
            let mut ratio_sum = 0.0;
            let mut ratio_count = 0usize;

            for edge in &self.edges {
                if edge.edge_type != EdgeType::Measurement {
                    continue;
                }
                let Some((start, end)) = self.edge_endpoints(edge) else {
                    continue;
                };
                let distance_pixels = start.distance(end);
                if distance_pixels <= f64::EPSILON {
                    continue;
                }
                let Some(distance_meters) = edge.distance_meters() else {
                    continue;
                };
                ratio_sum += distance_meters / distance_pixels;
                ratio_count += 1;
            }

            self.drawing_meters_per_pixel = if ratio_count > 0 {
                ratio_sum / ratio_count as f64
            } else {
                DEFAULT_METERS_PER_PIXEL
            };

            if self.drawing_width > 0.0 && self.drawing_height > 0.0 {
                self.x_meters = self.drawing_width * self.drawing_meters_per_pixel;
                self.y_meters = self.drawing_height * self.drawing_meters_per_pixel;
            }
        }

        /// 删除全部处于选中状态的边，返回删除数量。
        pub fn delete_selected_edges(&mut self) -> usize {
            let before = self.edges.len();
            self.edges.retain(|edge| !edge.selected);
            before - self.edges.len()
        }

        /// 把 `vertex_idx` 从多边形的顶点环中移除（含重复出现），并清除
        /// 该顶点的选中标记。下标越界时静默忽略——交互编辑的容错策略，
        /// 不是错误。顶点本身保留在 `vertices` 中。
        pub fn remove_polygon_vertex(&mut self, polygon_idx: usize, vertex_idx: usize) {
            if polygon_idx >= self.polygons.len() {
                return;
            }
            if vertex_idx >= self.vertices.len() {
                return;
            }
            self.vertices[vertex_idx].selected = false;
            self.polygons[polygon_idx]
                .vertices
                .retain(|&idx| idx != vertex_idx);
        }

        /// 找出多边形边界上离 `point` 最近的线段，返回该线段起始顶点的
        /// 下标与投影点；新增顶点将从这里拼接进顶点环。顶点环按闭合
        /// 处理（末顶点连回首顶点）。多边形为空或下标越界时返回 None。
        pub fn polygon_edge_drag_press(
            &self,
            polygon_idx: usize,
            point: Point2,
        ) -> Option<(usize, Point2)> {
            let polygon = self.polygons.get(polygon_idx)?;
            if polygon.vertices.is_empty() {
                return None;
            }

            let mut best: Option<(usize, Point2)> = None;
            let mut best_dist = f64::INFINITY;

            for (i, &v0) in polygon.vertices.iter().enumerate() {
                let v1 = polygon.vertices[(i + 1) % polygon.vertices.len()];
                let a = self.vertices.get(v0)?.position;
                let b = self.vertices.get(v1)?.position;
                let (dist, projected) = point_segment_distance(point, a, b);
                if dist < best_dist {
                    best_dist = dist;
                    best = Some((v0, projected));
                }
            }
            best
        }

        /// 楼层范围：优先取全部顶点的包围盒，没有顶点时退化为底图矩形。
        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            for vertex in &self.vertices {
                bounds.include_point(vertex.position);
            }
            if !bounds.is_empty() {
                return Some(bounds);
            }
            if self.drawing_width > 0.0 && self.drawing_height > 0.0 {
                return Some(Bounds2D::new(
                    Point2::new(0.0, 0.0),
                    Point2::new(self.drawing_width, self.drawing_height),
                ));
            }
            None
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn measurement(start: usize, end: usize, meters: f64) -> Edge {
            Edge::new(start, end, EdgeType::Measurement)
                .with_param("distance", ParamValue::Double(meters))
        }

        #[test]
        fn single_measurement_sets_scale_exactly() {
            let mut level = Level::new("L1");
            level.add_vertex(0.0, 0.0);
            level.add_vertex(100.0, 0.0);
            level.add_edge(measurement(0, 1, 5.0));

            level.calculate_scale();
            assert!((level.drawing_meters_per_pixel - 0.05).abs() < 1e-12);
        }

        #[test]
        fn two_measurements_average_their_ratios() {
            let mut level = Level::new("L1");
            level.add_vertex(0.0, 0.0);
            level.add_vertex(100.0, 0.0);
            level.add_vertex(0.0, 200.0);
            level.add_edge(measurement(0, 1, 10.0)); // 0.1 m/px
            level.add_edge(measurement(0, 2, 40.0)); // 0.2 m/px

            level.calculate_scale();
            assert!((level.drawing_meters_per_pixel - 0.15).abs() < 1e-12);
        }

        #[test]
        fn no_measurements_falls_back_to_default_scale() {
            let mut level = Level::new("L1");
            level.drawing_meters_per_pixel = 0.42;
            level.calculate_scale();
            assert!((level.drawing_meters_per_pixel - DEFAULT_METERS_PER_PIXEL).abs() < 1e-12);
        }

        #[test]
        fn degenerate_measurements_do_not_poison_the_mean() {
            let mut level = Level::new("L1");
            level.add_vertex(0.0, 0.0);
            level.add_vertex(100.0, 0.0);
            // 端点重合与缺少 distance 参数的测量边都应被跳过
            level.add_edge(measurement(0, 0, 3.0));
            level.add_edge(Edge::new(0, 1, EdgeType::Measurement));
            level.add_edge(measurement(0, 1, 5.0));

            level.calculate_scale();
            assert!((level.drawing_meters_per_pixel - 0.05).abs() < 1e-12);
        }

        #[test]
        fn scale_recomputes_meter_dimensions_from_pixels() {
            let mut level = Level::new("L1");
            level.drawing_width = 800.0;
            level.drawing_height = 600.0;
            level.add_vertex(0.0, 0.0);
            level.add_vertex(10.0, 0.0);
            level.add_edge(measurement(0, 1, 1.0)); // 0.1 m/px

            level.calculate_scale();
            assert!((level.x_meters - 80.0).abs() < 1e-9);
            assert!((level.y_meters - 60.0).abs() < 1e-9);
        }

        #[test]
        fn nearest_polygon_edge_on_unit_square() {
            let mut level = Level::new("L1");
            level.add_vertex(0.0, 0.0);
            level.add_vertex(1.0, 0.0);
            level.add_vertex(1.0, 1.0);
            level.add_vertex(0.0, 1.0);
            level.polygons.push(Polygon::floor(vec![0, 1, 2, 3]));

            // 靠近右侧边 (1,0)-(1,1) 的中点
            let (idx, projected) = level
                .polygon_edge_drag_press(0, Point2::new(1.2, 0.5))
                .expect("projection should exist");
            assert_eq!(idx, 1);
            assert!((projected.x() - 1.0).abs() < 1e-12);
            assert!((projected.y() - 0.5).abs() < 1e-12);

            // 闭合段 (0,1)-(0,0) 也要参与比较
            let (idx, _) = level
                .polygon_edge_drag_press(0, Point2::new(-0.3, 0.5))
                .expect("projection should exist");
            assert_eq!(idx, 3);
        }

        #[test]
        fn drag_press_rejects_empty_or_missing_polygon() {
            let mut level = Level::new("L1");
            assert!(
                level
                    .polygon_edge_drag_press(0, Point2::new(0.0, 0.0))
                    .is_none()
            );
            level.polygons.push(Polygon::floor(Vec::new()));
            assert!(
                level
                    .polygon_edge_drag_press(0, Point2::new(0.0, 0.0))
                    .is_none()
            );
        }

        #[test]
        fn remove_polygon_vertex_is_noop_when_out_of_range() {
            let mut level = Level::new("L1");
            level.add_vertex(0.0, 0.0);
            level.polygons.push(Polygon::floor(vec![0]));
            let snapshot = level.clone();

            level.remove_polygon_vertex(5, 0);
            level.remove_polygon_vertex(0, 5);
            assert_eq!(level, snapshot);
        }

        #[test]
        fn remove_polygon_vertex_clears_all_occurrences() {
            let mut level = Level::new("L1");
            level.add_vertex(0.0, 0.0);
            level.add_vertex(1.0, 0.0);
            level.add_vertex(1.0, 1.0);
            level.vertices[1].selected = true;
            level.polygons.push(Polygon::floor(vec![0, 1, 2, 1]));

            level.remove_polygon_vertex(0, 1);
            assert_eq!(level.polygons[0].vertices, vec![0, 2]);
            assert!(!level.vertices[1].selected);
            assert_eq!(level.vertices.len(), 3);
        }

        #[test]
        fn delete_selected_edges_keeps_the_rest() {
            let mut level = Level::new("L1");
            level.add_vertex(0.0, 0.0);
            level.add_vertex(1.0, 0.0);
            level.add_edge(Edge::new(0, 1, EdgeType::Wall));
            let idx = level.add_edge(Edge::new(1, 0, EdgeType::Lane));
            level.edges[idx].selected = true;

            assert_eq!(level.delete_selected_edges(), 1);
            assert_eq!(level.edges.len(), 1);
            assert_eq!(level.edges[0].edge_type, EdgeType::Wall);
        }

        #[test]
        fn bounds_fall_back_to_drawing_extent() {
            let mut level = Level::new("L1");
            level.drawing_width = 200.0;
            level.drawing_height = 100.0;
            let bounds = level.bounds().expect("drawing extent");
            assert!((bounds.max().x() - 200.0).abs() < 1e-12);
            assert!((bounds.max().y() - 100.0).abs() < 1e-12);

            level.add_vertex(5.0, 5.0);
            level.add_vertex(20.0, 8.0);
            let bounds = level.bounds().expect("vertex bounds");
            assert!((bounds.min().x() - 5.0).abs() < 1e-12);
            assert!((bounds.max().x() - 20.0).abs() < 1e-12);
        }
    }
}

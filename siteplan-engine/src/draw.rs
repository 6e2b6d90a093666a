//! 把楼层实体展开为与渲染后端无关的绘制图元。
//! 所有长度都已换算为底图像素，调用方只负责画线、圆和多边形。

use std::f64::consts::PI;

use siteplan_core::geometry::{
    Point2, Vector2, arrow_chevron, door_slide_path, door_swing_path, oriented_box,
};
use siteplan_core::level::{Edge, EdgeType, Level};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapStyle {
    Flat,
    Round,
}

/// 渲染后端消费的绘制指令。坐标系与楼层一致（底图像素）。
#[derive(Debug, Clone, PartialEq)]
pub enum DrawPrimitive {
    Line {
        start: Point2,
        end: Point2,
        width: f64,
        color: Color,
        cap: CapStyle,
    },
    Circle {
        center: Point2,
        radius: f64,
        color: Color,
    },
    /// 一组折线（每条子路径按顶点顺序连线，不自动闭合）。
    Path {
        subpaths: Vec<Vec<Point2>>,
        width: f64,
        color: Color,
    },
    Polygon {
        points: Vec<Point2>,
        fill: Color,
        outline: Color,
    },
}

const SELECTED_LINE: Color = Color::rgba(0.5, 0.0, 0.0, 0.5);

// graph_idx 0..=5 的车道色相，越界取深灰
const LANE_GRAPH_COLORS: [Color; 6] = [
    Color::rgba(0.0, 0.5, 0.0, 0.5),
    Color::rgba(0.0, 0.0, 0.5, 0.5),
    Color::rgba(0.0, 0.5, 0.5, 0.5),
    Color::rgba(0.5, 0.5, 0.0, 0.5),
    Color::rgba(0.5, 0.0, 0.5, 0.5),
    Color::rgba(0.5, 0.5, 0.5, 0.5),
];
const LANE_FALLBACK: Color = Color::rgba(0.2, 0.2, 0.2, 0.5);
const ARROW_COLOR: Color = Color::rgba(0.0, 0.0, 0.0, 0.5);
const ORIENTATION_COLOR: Color = Color::rgb(1.0, 1.0, 1.0);
const ORIENTATION_STROKE: f64 = 5.0;
const WALL_COLOR: Color = Color::rgba(0.0, 0.0, 1.0, 0.5);
const MEASUREMENT_COLOR: Color = Color::rgba(0.5, 0.0, 1.0, 0.5);
const DOOR_COLOR: Color = Color::rgba(1.0, 0.6, 0.0, 0.5);
const DOOR_SELECTED: Color = Color::rgba(1.0, 1.0, 0.0, 0.5);
const MOTION_COLOR: Color = Color::rgb(0.0, 0.0, 0.0);
const VERTEX_COLOR: Color = Color::rgb(0.0, 0.6, 0.0);
const VERTEX_SELECTED: Color = Color::rgb(0.8, 0.0, 0.0);
const FLOOR_FILL: Color = Color::rgba(1.0, 1.0, 0.5, 0.5);
const FLOOR_SELECTED: Color = Color::rgba(1.0, 0.0, 0.0, 0.5);
const FLOOR_OUTLINE: Color = Color::rgb(0.0, 0.0, 0.0);

fn lane_color(edge: &Edge) -> Color {
    if edge.selected {
        return SELECTED_LINE;
    }
    usize::try_from(edge.graph_idx())
        .ok()
        .and_then(|idx| LANE_GRAPH_COLORS.get(idx).copied())
        .unwrap_or(LANE_FALLBACK)
}

/// 车道：主线、行进方向的箭头串，以及中点处的朝向图标。
pub fn lane_primitives(level: &Level, edge: &Edge) -> Vec<DrawPrimitive> {
    let Some((start, end)) = level.edge_endpoints(edge) else {
        return Vec::new();
    };
    let scale = level.drawing_meters_per_pixel;
    let pen_width = 1.0 / scale;

    let mut prims = vec![DrawPrimitive::Line {
        start,
        end,
        width: pen_width,
        color: lane_color(edge),
        cap: CapStyle::Round,
    }];

    let Some(dir) = Vector2::from_points(start, end).normalize() else {
        return prims;
    };
    let length = start.distance(end);

    // 沿车道等距铺开箭头，双向车道再铺一遍反向箭头。
    // 正向箭头从起点（d = 0）就开始铺，反向箭头跳过起点。
    let spacing = pen_width / 2.0;
    let arm = pen_width / 2.5;
    let arrow_width = pen_width / 8.0;
    let mut d = 0.0;
    while d < length {
        let center = start.translate(dir.scale(d));
        for (from, to) in arrow_chevron(center, dir, arm, arm) {
            prims.push(DrawPrimitive::Line {
                start: from,
                end: to,
                width: arrow_width,
                color: ARROW_COLOR,
                cap: CapStyle::Round,
            });
        }
        if d > 0.0 && edge.is_bidirectional() {
            for (from, to) in arrow_chevron(center, dir.scale(-1.0), arm, arm) {
                prims.push(DrawPrimitive::Line {
                    start: from,
                    end: to,
                    width: arrow_width,
                    color: ARROW_COLOR,
                    cap: CapStyle::Round,
                });
            }
        }
        d += spacing;
    }

    // 带朝向约束的车道在中点画机器人足迹框加一段航向刻线
    if let Some(orientation) = edge.orientation() {
        let heading_dir = match orientation {
            "forward" => dir,
            "backward" => dir.scale(-1.0),
            other => {
                warn!(orientation = other, "未知的车道朝向，跳过足迹图标");
                return prims;
            }
        };
        let mid = start.midpoint(end);
        let yaw = heading_dir.angle();
        let corners = oriented_box(mid, yaw, 0.5 / scale, 0.4 / scale);
        let mut footprint: Vec<Point2> = corners.to_vec();
        footprint.push(corners[0]);
        let heading = vec![mid, mid.translate(heading_dir.scale(1.0 / scale))];
        prims.push(DrawPrimitive::Path {
            subpaths: vec![footprint, heading],
            width: ORIENTATION_STROKE,
            color: ORIENTATION_COLOR,
        });
    }

    prims
}

pub fn wall_primitives(level: &Level, edge: &Edge) -> Vec<DrawPrimitive> {
    let Some((start, end)) = level.edge_endpoints(edge) else {
        return Vec::new();
    };
    let scale = level.drawing_meters_per_pixel;
    vec![DrawPrimitive::Line {
        start,
        end,
        width: 0.2 / scale,
        color: if edge.selected { SELECTED_LINE } else { WALL_COLOR },
        cap: CapStyle::Round,
    }]
}

pub fn measurement_primitives(level: &Level, edge: &Edge) -> Vec<DrawPrimitive> {
    let Some((start, end)) = level.edge_endpoints(edge) else {
        return Vec::new();
    };
    let scale = level.drawing_meters_per_pixel;
    vec![DrawPrimitive::Line {
        start,
        end,
        width: 0.5 / scale,
        color: if edge.selected {
            SELECTED_LINE
        } else {
            MEASUREMENT_COLOR
        },
        cap: CapStyle::Round,
    }]
}

/// 门：静止门线，外加按门类型展开的运动包络。没有 `type` 参数时
/// 只画门线。
pub fn door_primitives(level: &Level, edge: &Edge) -> Vec<DrawPrimitive> {
    let Some((v_start, v_end)) = level.edge_endpoints(edge) else {
        return Vec::new();
    };
    let scale = level.drawing_meters_per_pixel;

    let mut prims = vec![DrawPrimitive::Line {
        start: v_start,
        end: v_end,
        width: 0.2 / scale,
        color: if edge.selected { DOOR_SELECTED } else { DOOR_COLOR },
        cap: CapStyle::Round,
    }];

    let Some(door_type) = edge.door_type() else {
        return prims;
    };

    let length = v_start.distance(v_end);
    let door_angle = Vector2::from_points(v_start, v_end).angle();
    let swing = (PI / 180.0) * edge.motion_degrees() * edge.motion_direction() as f64;

    let subpaths: Vec<Vec<Point2>> = match door_type {
        "hinged" => {
            let (hinge, free) = match edge.motion_axis() {
                "start" => (v_start, v_end),
                "end" => (v_end, v_start),
                other => {
                    warn!(motion_axis = other, "未知的门轴标记，按 end 处理");
                    (v_end, v_start)
                }
            };
            let closed = Vector2::from_points(hinge, free).angle();
            vec![door_swing_path(hinge, length, closed, closed + swing)]
        }
        "double_hinged" => {
            let half = length / 2.0;
            vec![
                door_swing_path(v_start, half, door_angle, door_angle + swing),
                door_swing_path(v_end, half, door_angle + PI, door_angle + PI - swing),
            ]
        }
        "sliding" => {
            let [line, pocket] = door_slide_path(v_start, length, door_angle, 0.15 / scale);
            vec![line, pocket]
        }
        "double_sliding" => {
            let half = length / 2.0;
            let [line_a, pocket_a] = door_slide_path(v_start, half, door_angle, 0.15 / scale);
            let [line_b, pocket_b] = door_slide_path(v_end, half, door_angle + PI, 0.15 / scale);
            vec![line_a, pocket_a, line_b, pocket_b]
        }
        other => {
            warn!(door_type = other, "未知的门类型，跳过运动包络");
            Vec::new()
        }
    };

    if !subpaths.is_empty() {
        prims.push(DrawPrimitive::Path {
            subpaths,
            width: 0.05 / scale,
            color: MOTION_COLOR,
        });
    }
    prims
}

pub fn vertex_primitives(level: &Level) -> Vec<DrawPrimitive> {
    let scale = level.drawing_meters_per_pixel;
    level
        .vertices
        .iter()
        .map(|vertex| DrawPrimitive::Circle {
            center: vertex.position,
            radius: 0.1 / scale,
            color: if vertex.selected {
                VERTEX_SELECTED
            } else {
                VERTEX_COLOR
            },
        })
        .collect()
}

pub fn polygon_primitives(level: &Level) -> Vec<DrawPrimitive> {
    let mut prims = Vec::new();
    for polygon in &level.polygons {
        let mut points = Vec::with_capacity(polygon.vertices.len());
        let mut valid = true;
        for &idx in &polygon.vertices {
            match level.vertices.get(idx) {
                Some(vertex) => points.push(vertex.position),
                None => {
                    warn!(vertex_idx = idx, "多边形引用了不存在的顶点，跳过");
                    valid = false;
                    break;
                }
            }
        }
        if !valid || points.len() < 3 {
            continue;
        }
        prims.push(DrawPrimitive::Polygon {
            points,
            fill: if polygon.selected {
                FLOOR_SELECTED
            } else {
                FLOOR_FILL
            },
            outline: FLOOR_OUTLINE,
        });
    }
    prims
}

/// 整个楼层的绘制图元，按地板、边、顶点的顺序排列（后画的在上层）。
pub fn level_primitives(level: &Level) -> Vec<DrawPrimitive> {
    let mut prims = polygon_primitives(level);
    for edge in &level.edges {
        let edge_prims = match edge.edge_type {
            EdgeType::Lane => lane_primitives(level, edge),
            EdgeType::Wall => wall_primitives(level, edge),
            EdgeType::Measurement => measurement_primitives(level, edge),
            EdgeType::Door => door_primitives(level, edge),
        };
        prims.extend(edge_prims);
    }
    prims.extend(vertex_primitives(level));
    prims
}

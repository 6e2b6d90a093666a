use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use siteplan_core::level::{
    DEFAULT_METERS_PER_PIXEL, Edge, EdgeType, Level, Model, ParamValue, Polygon, Vertex,
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to encode {path:?}: {source}")]
    EncodeError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid level structure: {0}")]
    InvalidLevel(String),
    #[error("unable to read drawing image {filename}")]
    UnreadableDrawing { filename: String },
}

impl IoError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidLevel(message.into())
    }
}

pub trait LevelLoader {
    fn load(&self, path: &Path) -> Result<Level, IoError>;
}

pub trait LevelSaver {
    fn save(&self, level: &Level, path: &Path) -> Result<(), IoError>;
}

/// 探测底图文件的像素尺寸。读取失败时返回 None，由调用方决定如何报错。
pub trait DrawingProbe {
    fn dimensions(&self, path: &Path) -> Option<(u32, u32)>;
}

/// 基于 `image` 的探测器，只解码文件头，不加载整幅位图。
pub struct ImageProbe;

impl DrawingProbe for ImageProbe {
    fn dimensions(&self, path: &Path) -> Option<(u32, u32)> {
        image::image_dimensions(path).ok()
    }
}

/// 楼层 YAML 的读写入口。`drawing_roots` 是底图的额外搜索目录，
/// 排在楼层文件所在目录之后。
pub struct YamlFacade<P = ImageProbe> {
    drawing_roots: Vec<PathBuf>,
    probe: P,
}

impl YamlFacade<ImageProbe> {
    pub fn new() -> Self {
        Self {
            drawing_roots: Vec::new(),
            probe: ImageProbe,
        }
    }

    pub fn with_roots(drawing_roots: Vec<PathBuf>) -> Self {
        Self {
            drawing_roots,
            probe: ImageProbe,
        }
    }
}

impl Default for YamlFacade<ImageProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: DrawingProbe> YamlFacade<P> {
    pub fn with_probe(probe: P, drawing_roots: Vec<PathBuf>) -> Self {
        Self {
            drawing_roots,
            probe,
        }
    }

    /// 从已解析的 YAML 文档构造楼层。`base_dir` 是底图的首选搜索目录
    /// （通常为楼层文件所在目录）。
    pub fn level_from_yaml(
        &self,
        name: &str,
        doc: &Value,
        base_dir: Option<&Path>,
    ) -> Result<Level, IoError> {
        let root = doc
            .as_mapping()
            .ok_or_else(|| IoError::invalid("楼层文档的根节点必须是映射"))?;

        let mut level = Level::new(name);

        // 底图优先于显式尺寸；`drawing` 不是映射时按缺失处理
        let drawing = root.get("drawing").and_then(Value::as_mapping);
        if let Some(drawing) = drawing {
            let filename = drawing
                .get("filename")
                .and_then(Value::as_str)
                .ok_or_else(|| IoError::invalid("drawing 映射缺少 filename 字段"))?
                .to_string();
            let (width, height) = self.probe_drawing(&filename, base_dir)?;
            level.drawing_filename = Some(filename);
            level.drawing_width = f64::from(width);
            level.drawing_height = f64::from(height);
        } else {
            let x_meters = root.get("x_meters").and_then(Value::as_f64);
            let y_meters = root.get("y_meters").and_then(Value::as_f64);
            if let (Some(x_meters), Some(y_meters)) = (x_meters, y_meters) {
                level.x_meters = x_meters;
                level.y_meters = y_meters;
            } else {
                level.x_meters = 100.0;
                level.y_meters = 100.0;
            }
            level.drawing_meters_per_pixel = DEFAULT_METERS_PER_PIXEL;
            level.drawing_width = level.x_meters / level.drawing_meters_per_pixel;
            level.drawing_height = level.y_meters / level.drawing_meters_per_pixel;
        }

        if let Some(vertices) = root.get("vertices").and_then(Value::as_sequence) {
            for node in vertices {
                level.vertices.push(vertex_from_yaml(node)?);
            }
        }

        for (key, edge_type) in [
            ("lanes", EdgeType::Lane),
            ("walls", EdgeType::Wall),
            ("measurements", EdgeType::Measurement),
            ("doors", EdgeType::Door),
        ] {
            if let Some(edges) = root.get(key).and_then(Value::as_sequence) {
                for node in edges {
                    level.edges.push(edge_from_yaml(node, edge_type)?);
                }
            }
        }

        if let Some(models) = root.get("models").and_then(Value::as_sequence) {
            for node in models {
                level.models.push(model_from_yaml(node)?);
            }
        }

        if let Some(floors) = root.get("floors").and_then(Value::as_sequence) {
            for node in floors {
                level.polygons.push(floor_from_yaml(node)?);
            }
        }

        if let Some(elevation) = root.get("elevation").and_then(Value::as_f64) {
            level.elevation = elevation;
        }

        // 全部实体就位后再做比例尺估算
        level.calculate_scale();
        debug!(
            name = level.name,
            meters_per_pixel = level.drawing_meters_per_pixel,
            "楼层比例尺已估算"
        );

        Ok(level)
    }

    fn probe_drawing(
        &self,
        filename: &str,
        base_dir: Option<&Path>,
    ) -> Result<(u32, u32), IoError> {
        let candidate = Path::new(filename);
        if candidate.is_absolute() {
            return self
                .probe
                .dimensions(candidate)
                .ok_or_else(|| IoError::UnreadableDrawing {
                    filename: filename.to_string(),
                });
        }

        let mut dirs: Vec<&Path> = Vec::new();
        if let Some(base) = base_dir {
            dirs.push(base);
        }
        dirs.extend(self.drawing_roots.iter().map(PathBuf::as_path));

        for dir in dirs {
            if let Some(dims) = self.probe.dimensions(&dir.join(filename)) {
                return Ok(dims);
            }
        }
        Err(IoError::UnreadableDrawing {
            filename: filename.to_string(),
        })
    }
}

impl<P: DrawingProbe> LevelLoader for YamlFacade<P> {
    fn load(&self, path: &Path) -> Result<Level, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: Value = serde_yaml::from_str(&data).map_err(|source| IoError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("level");
        let level = self.level_from_yaml(name, &doc, path.parent())?;
        info!(
            name = level.name,
            vertices = level.vertices.len(),
            edges = level.edges.len(),
            "楼层加载完成"
        );
        Ok(level)
    }
}

impl<P: DrawingProbe> LevelSaver for YamlFacade<P> {
    fn save(&self, level: &Level, path: &Path) -> Result<(), IoError> {
        let doc = level_to_yaml(level);
        let data = serde_yaml::to_string(&doc).map_err(|source| IoError::EncodeError {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, data).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn vertex_from_yaml(node: &Value) -> Result<Vertex, IoError> {
    let seq = node
        .as_sequence()
        .ok_or_else(|| IoError::invalid("顶点必须是 [x, y] 或 [x, y, name] 序列"))?;
    if seq.len() < 2 {
        return Err(IoError::invalid("顶点序列至少需要 x 与 y 两个分量"));
    }
    let x = yaml_f64(&seq[0], "顶点 x")?;
    let y = yaml_f64(&seq[1], "顶点 y")?;
    let name = seq
        .get(2)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    Ok(Vertex::named(x, y, name))
}

fn edge_from_yaml(node: &Value, edge_type: EdgeType) -> Result<Edge, IoError> {
    let seq = node
        .as_sequence()
        .ok_or_else(|| IoError::invalid("边必须是 [start, end, params] 序列"))?;
    if seq.len() < 2 {
        return Err(IoError::invalid("边序列至少需要起止顶点下标"));
    }
    let start_idx = yaml_usize(&seq[0], "边的起点下标")?;
    let end_idx = yaml_usize(&seq[1], "边的终点下标")?;

    let mut edge = Edge::new(start_idx, end_idx, edge_type);
    if let Some(params) = seq.get(2) {
        let params = params
            .as_mapping()
            .ok_or_else(|| IoError::invalid("边的第三个元素必须是参数映射"))?;
        for (key, value) in params {
            let name = key
                .as_str()
                .ok_or_else(|| IoError::invalid("参数名必须是字符串"))?;
            edge.params
                .insert(name.to_string(), param_from_yaml(name, value)?);
        }
    }
    Ok(edge)
}

// 参数值编码为 [tag, value]，tag 1=字符串 2=整数 3=浮点
fn param_from_yaml(name: &str, node: &Value) -> Result<ParamValue, IoError> {
    let seq = node
        .as_sequence()
        .filter(|seq| seq.len() == 2)
        .ok_or_else(|| IoError::invalid(format!("参数 {name} 必须是 [类型标签, 值] 序列")))?;
    let tag = seq[0]
        .as_i64()
        .ok_or_else(|| IoError::invalid(format!("参数 {name} 的类型标签必须是整数")))?;
    match tag {
        1 => {
            let value = seq[1]
                .as_str()
                .ok_or_else(|| IoError::invalid(format!("参数 {name} 声明为字符串但值不匹配")))?;
            Ok(ParamValue::String(value.to_string()))
        }
        2 => {
            let value = seq[1]
                .as_i64()
                .ok_or_else(|| IoError::invalid(format!("参数 {name} 声明为整数但值不匹配")))?;
            Ok(ParamValue::Int(value))
        }
        3 => {
            let value = seq[1]
                .as_f64()
                .ok_or_else(|| IoError::invalid(format!("参数 {name} 声明为浮点但值不匹配")))?;
            Ok(ParamValue::Double(value))
        }
        other => Err(IoError::invalid(format!(
            "参数 {name} 使用了未知的类型标签 {other}"
        ))),
    }
}

fn model_from_yaml(node: &Value) -> Result<Model, IoError> {
    let map = node
        .as_mapping()
        .ok_or_else(|| IoError::invalid("模型条目必须是映射"))?;
    let field = |key: &str| -> Result<&Value, IoError> {
        map.get(key)
            .ok_or_else(|| IoError::invalid(format!("模型条目缺少 {key} 字段")))
    };
    Ok(Model {
        model_name: field("model_name")?
            .as_str()
            .ok_or_else(|| IoError::invalid("模型 model_name 必须是字符串"))?
            .to_string(),
        name: field("name")?
            .as_str()
            .ok_or_else(|| IoError::invalid("模型 name 必须是字符串"))?
            .to_string(),
        x: yaml_f64(field("x")?, "模型 x")?,
        y: yaml_f64(field("y")?, "模型 y")?,
        yaw: yaml_f64(field("yaw")?, "模型 yaw")?,
    })
}

fn floor_from_yaml(node: &Value) -> Result<Polygon, IoError> {
    let map = node
        .as_mapping()
        .ok_or_else(|| IoError::invalid("地板条目必须是映射"))?;
    let vertices = map
        .get("vertices")
        .and_then(Value::as_sequence)
        .ok_or_else(|| IoError::invalid("地板条目缺少 vertices 序列"))?;
    let indices = vertices
        .iter()
        .map(|value| yaml_usize(value, "地板顶点下标"))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::floor(indices))
}

fn yaml_f64(value: &Value, what: &str) -> Result<f64, IoError> {
    value
        .as_f64()
        .ok_or_else(|| IoError::invalid(format!("{what} 必须是数值")))
}

fn yaml_usize(value: &Value, what: &str) -> Result<usize, IoError> {
    value
        .as_u64()
        .map(|v| v as usize)
        .ok_or_else(|| IoError::invalid(format!("{what} 必须是非负整数")))
}

/// 楼层到 YAML 文档的映射，与加载端互逆。
pub fn level_to_yaml(level: &Level) -> Value {
    let mut root = Mapping::new();

    if let Some(filename) = &level.drawing_filename {
        let mut drawing = Mapping::new();
        drawing.insert(
            Value::from("filename"),
            Value::from(filename.clone()),
        );
        root.insert(Value::from("drawing"), Value::Mapping(drawing));
    } else {
        root.insert(Value::from("x_meters"), Value::from(level.x_meters));
        root.insert(Value::from("y_meters"), Value::from(level.y_meters));
    }

    let vertices: Vec<Value> = level.vertices.iter().map(vertex_to_yaml).collect();
    root.insert(Value::from("vertices"), Value::Sequence(vertices));

    for (key, edge_type) in [
        ("lanes", EdgeType::Lane),
        ("walls", EdgeType::Wall),
        ("measurements", EdgeType::Measurement),
        ("doors", EdgeType::Door),
    ] {
        let edges: Vec<Value> = level
            .edges
            .iter()
            .filter(|edge| edge.edge_type == edge_type)
            .map(edge_to_yaml)
            .collect();
        if !edges.is_empty() {
            root.insert(Value::from(key), Value::Sequence(edges));
        }
    }

    if !level.models.is_empty() {
        let models: Vec<Value> = level.models.iter().map(model_to_yaml).collect();
        root.insert(Value::from("models"), Value::Sequence(models));
    }

    if !level.polygons.is_empty() {
        let floors: Vec<Value> = level
            .polygons
            .iter()
            .map(|polygon| {
                let mut map = Mapping::new();
                let indices: Vec<Value> = polygon
                    .vertices
                    .iter()
                    .map(|&idx| Value::from(idx as u64))
                    .collect();
                map.insert(Value::from("vertices"), Value::Sequence(indices));
                Value::Mapping(map)
            })
            .collect();
        root.insert(Value::from("floors"), Value::Sequence(floors));
    }

    root.insert(Value::from("elevation"), Value::from(level.elevation));

    Value::Mapping(root)
}

fn vertex_to_yaml(vertex: &Vertex) -> Value {
    let mut seq = vec![
        Value::from(vertex.position.x()),
        Value::from(vertex.position.y()),
    ];
    if !vertex.name.is_empty() {
        seq.push(Value::from(vertex.name.clone()));
    }
    Value::Sequence(seq)
}

fn edge_to_yaml(edge: &Edge) -> Value {
    let mut params = Mapping::new();
    for (name, value) in &edge.params {
        let encoded = match value {
            ParamValue::String(v) => vec![Value::from(1), Value::from(v.clone())],
            ParamValue::Int(v) => vec![Value::from(2), Value::from(*v)],
            ParamValue::Double(v) => vec![Value::from(3), Value::from(*v)],
        };
        params.insert(Value::from(name.clone()), Value::Sequence(encoded));
    }
    Value::Sequence(vec![
        Value::from(edge.start_idx as u64),
        Value::from(edge.end_idx as u64),
        Value::Mapping(params),
    ])
}

fn model_to_yaml(model: &Model) -> Value {
    let mut map = Mapping::new();
    map.insert(
        Value::from("model_name"),
        Value::from(model.model_name.clone()),
    );
    map.insert(Value::from("name"), Value::from(model.name.clone()));
    map.insert(Value::from("x"), Value::from(model.x));
    map.insert(Value::from("y"), Value::from(model.y));
    map.insert(Value::from("yaw"), Value::from(model.yaw));
    Value::Mapping(map)
}

//! The Metal vocabulary layered on top of C++.
//!
//! Address space qualifiers, shader attributes and standard library types.
//! The grammar lexes address spaces as `type_qualifier` and the scalar,
//! vector and matrix types as `primitive_type`; attributes and the templated
//! texture types go through the C++ rules unchanged.

use std::fmt;

use serde::Serialize;

/// A memory address space qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressSpace {
    /// Device memory, readable and writable by all threads.
    Device,
    /// Memory shared by the threads of one threadgroup.
    Threadgroup,
    /// Read-only memory; stricter than C++ `const`.
    Constant,
    /// Per-thread memory.
    Thread,
}

impl AddressSpace {
    /// All address spaces, in declaration order.
    pub const ALL: [Self; 4] = [Self::Device, Self::Threadgroup, Self::Constant, Self::Thread];

    /// Recognise an address space keyword.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "device" => Some(Self::Device),
            "threadgroup" => Some(Self::Threadgroup),
            "constant" => Some(Self::Constant),
            "thread" => Some(Self::Thread),
            _ => None,
        }
    }

    /// The keyword spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Threadgroup => "threadgroup",
            Self::Constant => "constant",
            Self::Thread => "thread",
        }
    }
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shader pipeline stage, named by the entry point's leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderStage {
    /// Vertex function.
    Vertex,
    /// Fragment function.
    Fragment,
    /// Compute kernel.
    Kernel,
}

impl ShaderStage {
    /// Recognise a stage keyword.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "vertex" => Some(Self::Vertex),
            "fragment" => Some(Self::Fragment),
            "kernel" => Some(Self::Kernel),
            _ => None,
        }
    }

    /// The keyword spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Kernel => "kernel",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource kinds that bind an argument to an indexed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    /// `buffer(n)`
    Buffer,
    /// `texture(n)`
    Texture,
    /// `sampler(n)`
    Sampler,
    /// `threadgroup(n)`
    Threadgroup,
    /// `color(n)`, a render target for fragment input or output.
    Color,
}

impl BindingKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "buffer" => Some(Self::Buffer),
            "texture" => Some(Self::Texture),
            "sampler" => Some(Self::Sampler),
            "threadgroup" => Some(Self::Threadgroup),
            "color" => Some(Self::Color),
            _ => None,
        }
    }

    /// The attribute spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buffer => "buffer",
            Self::Texture => "texture",
            Self::Sampler => "sampler",
            Self::Threadgroup => "threadgroup",
            Self::Color => "color",
        }
    }
}

/// Builtin vertex output / fragment input values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Builtin {
    /// `stage_in`: per-vertex or per-fragment input assembled by the pipeline.
    StageIn,
    /// `position`
    Position,
    /// `point_size`
    PointSize,
    /// `clip_distance`
    ClipDistance,
    /// `front_facing`
    FrontFacing,
    /// `sample_id`
    SampleId,
    /// `sample_mask`
    SampleMask,
}

/// Depth output comparison mode for `depth(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthMode {
    /// No constraint on the written depth.
    Any,
    /// Written depth is at least the interpolated depth.
    Greater,
    /// Written depth is at most the interpolated depth.
    Less,
}

/// Interpolation qualifiers for fragment inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// `flat`: the provoking vertex's value, not interpolated.
    Flat,
    /// `center_perspective`, the default.
    CenterPerspective,
    /// `center_no_perspective`
    CenterNoPerspective,
    /// `centroid_perspective`
    CentroidPerspective,
    /// `centroid_no_perspective`
    CentroidNoPerspective,
    /// `sample_perspective`
    SamplePerspective,
    /// `sample_no_perspective`
    SampleNoPerspective,
}

/// An attribute with a meaning in Metal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MetalAttribute {
    /// `vertex`, `fragment` or `kernel`.
    Stage {
        /// The stage named.
        stage: ShaderStage,
    },
    /// An indexed resource binding such as `buffer(0)`.
    Binding {
        /// Resource kind.
        binding: BindingKind,
        /// Slot index.
        index: u32,
    },
    /// `stage_in` and the vertex/fragment builtins.
    Builtin {
        /// Which builtin.
        builtin: Builtin,
    },
    /// `depth(any|greater|less)`.
    Depth {
        /// Comparison mode.
        mode: DepthMode,
    },
    /// `early_fragment_tests`.
    EarlyFragmentTests,
    /// An interpolation qualifier.
    Interpolation {
        /// Which qualifier.
        interpolation: Interpolation,
    },
    /// `max_total_threads_per_threadgroup(n)`.
    MaxTotalThreadsPerThreadgroup {
        /// Upper bound on threads per threadgroup.
        threads: u32,
    },
}

impl MetalAttribute {
    /// Recognise an attribute from its name and its parenthesised argument.
    ///
    /// Attributes that take an argument are only recognised with a valid
    /// one, and attributes that take none are only recognised without.
    #[must_use]
    pub fn recognize(name: &str, argument: Option<&str>) -> Option<Self> {
        let argument = argument.map(str::trim);
        match argument {
            None => Self::recognize_bare(name),
            Some(arg) => {
                if let Some(binding) = BindingKind::from_name(name) {
                    let index = parse_index(arg)?;
                    return Some(Self::Binding { binding, index });
                }
                match name {
                    "depth" => {
                        let mode = match arg {
                            "any" => DepthMode::Any,
                            "greater" => DepthMode::Greater,
                            "less" => DepthMode::Less,
                            _ => return None,
                        };
                        Some(Self::Depth { mode })
                    }
                    "max_total_threads_per_threadgroup" => Some(Self::MaxTotalThreadsPerThreadgroup {
                        threads: parse_index(arg)?,
                    }),
                    _ => None,
                }
            }
        }
    }

    fn recognize_bare(name: &str) -> Option<Self> {
        if let Some(stage) = ShaderStage::from_keyword(name) {
            return Some(Self::Stage { stage });
        }
        let builtin = match name {
            "stage_in" => Builtin::StageIn,
            "position" => Builtin::Position,
            "point_size" => Builtin::PointSize,
            "clip_distance" => Builtin::ClipDistance,
            "front_facing" => Builtin::FrontFacing,
            "sample_id" => Builtin::SampleId,
            "sample_mask" => Builtin::SampleMask,
            "early_fragment_tests" => return Some(Self::EarlyFragmentTests),
            _ => {
                let interpolation = match name {
                    "flat" => Interpolation::Flat,
                    "center_perspective" => Interpolation::CenterPerspective,
                    "center_no_perspective" => Interpolation::CenterNoPerspective,
                    "centroid_perspective" => Interpolation::CentroidPerspective,
                    "centroid_no_perspective" => Interpolation::CentroidNoPerspective,
                    "sample_perspective" => Interpolation::SamplePerspective,
                    "sample_no_perspective" => Interpolation::SampleNoPerspective,
                    _ => return None,
                };
                return Some(Self::Interpolation { interpolation });
            }
        };
        Some(Self::Builtin { builtin })
    }

    /// The binding slot, for indexed resource attributes.
    #[must_use]
    pub const fn binding(&self) -> Option<(BindingKind, u32)> {
        match *self {
            Self::Binding { binding, index } => Some((binding, index)),
            _ => None,
        }
    }
}

/// Integer literal as written in an attribute argument: decimal or hex,
/// with an optional `u`/`U` suffix.
fn parse_index(text: &str) -> Option<u32> {
    let digits = text.trim_end_matches(['u', 'U']);
    match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => digits.parse().ok(),
    }
}

/// Scalar element types of vectors and matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    /// 16-bit float.
    Half,
    /// 32-bit float.
    Float,
    /// 32-bit signed integer.
    Int,
    /// 32-bit unsigned integer.
    Uint,
    /// 16-bit signed integer.
    Short,
    /// 16-bit unsigned integer.
    Ushort,
    /// 8-bit signed integer.
    Char,
    /// 8-bit unsigned integer.
    Uchar,
    /// Boolean.
    Bool,
}

impl Scalar {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "half" => Some(Self::Half),
            "float" => Some(Self::Float),
            "int" => Some(Self::Int),
            "uint" => Some(Self::Uint),
            "short" => Some(Self::Short),
            "ushort" => Some(Self::Ushort),
            "char" => Some(Self::Char),
            "uchar" => Some(Self::Uchar),
            "bool" => Some(Self::Bool),
            _ => None,
        }
    }
}

/// A Metal standard library type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BuiltinType {
    /// `half`, the only scalar Metal adds to C++.
    Half,
    /// `float4`, `packed_uint3`, ...
    Vector {
        /// Element type.
        scalar: Scalar,
        /// Number of components, 2 to 4.
        width: u8,
        /// Whether the `packed_` layout is used.
        packed: bool,
    },
    /// `float4x4`, `half2x3`, ... (columns by rows).
    Matrix {
        /// Element type, `half` or `float`.
        scalar: Scalar,
        /// Number of columns, 2 to 4.
        columns: u8,
        /// Number of rows, 2 to 4.
        rows: u8,
    },
    /// Color and depth textures.
    Texture,
    /// `sampler`
    Sampler,
    /// `atomic_int`, `atomic_uint`
    Atomic,
    /// Ray tracing objects.
    RayTracing,
    /// Visible and intersection function tables.
    FunctionTable,
}

const TEXTURE_TYPES: &[&str] = &[
    "texture1d",
    "texture1d_array",
    "texture2d",
    "texture2d_array",
    "texture2d_ms",
    "texture2d_ms_array",
    "texture3d",
    "texturecube",
    "texturecube_array",
    "texture_buffer",
    "depth2d",
    "depth2d_array",
    "depth2d_ms",
    "depth2d_ms_array",
    "depthcube",
    "depthcube_array",
];

const RAY_TRACING_TYPES: &[&str] = &[
    "ray_data",
    "raytracing_acceleration_structure",
    "intersection_query",
    "intersector",
    "primitive_acceleration_structure",
    "instance_acceleration_structure",
];

impl BuiltinType {
    /// Classify a type name, returning `None` for anything that is not a
    /// Metal standard library primitive.
    #[must_use]
    pub fn classify(name: &str) -> Option<Self> {
        match name {
            "half" => return Some(Self::Half),
            "sampler" => return Some(Self::Sampler),
            "atomic_int" | "atomic_uint" => return Some(Self::Atomic),
            "visible_function_table" | "intersection_function_table" => {
                return Some(Self::FunctionTable);
            }
            _ => {}
        }
        if TEXTURE_TYPES.contains(&name) {
            return Some(Self::Texture);
        }
        if RAY_TRACING_TYPES.contains(&name) {
            return Some(Self::RayTracing);
        }
        if let Some(rest) = name.strip_prefix("packed_") {
            return match Self::vector_or_matrix(rest)? {
                Self::Vector { scalar, width, .. } if scalar != Scalar::Bool => Some(Self::Vector {
                    scalar,
                    width,
                    packed: true,
                }),
                _ => None,
            };
        }
        Self::vector_or_matrix(name)
    }

    /// `<scalar><n>` or `<scalar><c>x<r>` with dimensions in `2..=4`.
    fn vector_or_matrix(name: &str) -> Option<Self> {
        let split = name.find(|c: char| c.is_ascii_digit())?;
        let scalar = Scalar::from_name(&name[..split])?;
        match name.as_bytes()[split..] {
            [width] => Some(Self::Vector {
                scalar,
                width: dimension(width)?,
                packed: false,
            }),
            [columns, b'x', rows] if matches!(scalar, Scalar::Half | Scalar::Float) => Some(Self::Matrix {
                scalar,
                columns: dimension(columns)?,
                rows: dimension(rows)?,
            }),
            _ => None,
        }
    }
}

fn dimension(byte: u8) -> Option<u8> {
    matches!(byte, b'2'..=b'4').then(|| byte - b'0')
}

/// Whether a word names a Metal standard library primitive type.
#[must_use]
pub fn is_builtin_type(name: &str) -> bool {
    BuiltinType::classify(name).is_some()
}

use std::fmt::Display;

use itertools::izip;
use ndarray::{Array2, ArrayView2, Axis};
use optional::{none, some, Optioned};

/// The numeric type a variable was stored as in its source file.
///
/// Values are always held as `f64` in memory, this only records the original representation so
/// that reports can show it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DType {
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl DType {
    /// Width of one element in bytes.
    pub fn size(self) -> usize {
        use DType::*;

        match self {
            I8 | U8 => 1,
            I16 | U16 => 2,
            F32 | I32 | U32 => 4,
            F64 | I64 | U64 => 8,
        }
    }

    /// Conventional lower case name, e.g. `float32`.
    pub fn name(self) -> &'static str {
        use DType::*;

        match self {
            F32 => "float32",
            F64 => "float64",
            I8 => "int8",
            I16 => "int16",
            I32 => "int32",
            I64 => "int64",
            U8 => "uint8",
            U16 => "uint16",
            U32 => "uint32",
            U64 => "uint64",
        }
    }
}

impl Default for DType {
    fn default() -> Self {
        DType::F64
    }
}

impl Display for DType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "{}", self.name())
    }
}

/// A variable stored in a [`Dataset`](super::Dataset).
#[derive(Debug, Clone)]
pub enum Variable {
    /// One value per timestep.
    Series {
        /// The values, missing values are `none`.
        values: Vec<Optioned<f64>>,
        /// Source representation.
        dtype: DType,
    },
    /// A (time × bin) distribution sampled on a named bin-center vector.
    Binned {
        /// The values, missing values are NaN.
        values: Array2<f64>,
        /// Name of the bin-center vector in the dataset.
        axis: String,
        /// Source representation.
        dtype: DType,
    },
}

impl Variable {
    /// Create a time series stored as `f64`.
    pub fn series(values: Vec<Optioned<f64>>) -> Self {
        Variable::Series {
            values,
            dtype: DType::F64,
        }
    }

    /// Create a binned variable stored as `f64`.
    pub fn binned<S: Into<String>>(values: Array2<f64>, axis: S) -> Self {
        Variable::Binned {
            values,
            axis: axis.into(),
            dtype: DType::F64,
        }
    }

    /// Builder method to record the source representation.
    pub fn with_dtype(mut self, new_dtype: DType) -> Self {
        match &mut self {
            Variable::Series { dtype, .. } | Variable::Binned { dtype, .. } => *dtype = new_dtype,
        }
        self
    }

    /// The source representation.
    pub fn dtype(&self) -> DType {
        match self {
            Variable::Series { dtype, .. } | Variable::Binned { dtype, .. } => *dtype,
        }
    }

    /// Number of timesteps.
    pub fn len(&self) -> usize {
        match self {
            Variable::Series { values, .. } => values.len(),
            Variable::Binned { values, .. } => values.nrows(),
        }
    }

    /// Whether there are no timesteps.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of elements.
    pub fn num_elements(&self) -> usize {
        match self {
            Variable::Series { values, .. } => values.len(),
            Variable::Binned { values, .. } => values.len(),
        }
    }

    /// Memory used by the variable in its source representation.
    pub fn nbytes(&self) -> usize {
        self.num_elements() * self.dtype().size()
    }

    /// The values if this is a time series.
    pub fn as_series(&self) -> Option<&[Optioned<f64>]> {
        match self {
            Variable::Series { values, .. } => Some(values),
            Variable::Binned { .. } => None,
        }
    }

    /// The values if this is a binned variable.
    pub fn as_binned(&self) -> Option<ArrayView2<f64>> {
        match self {
            Variable::Series { .. } => None,
            Variable::Binned { values, .. } => Some(values.view()),
        }
    }

    /// Name of the bin axis, if binned.
    pub fn axis(&self) -> Option<&str> {
        match self {
            Variable::Series { .. } => None,
            Variable::Binned { axis, .. } => Some(axis),
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Variable::Series { .. } => "series",
            Variable::Binned { .. } => "binned",
        }
    }

    pub(crate) fn rename_axis<F: Fn(&str) -> String>(self, rename: F) -> Self {
        match self {
            Variable::Binned {
                values,
                axis,
                dtype,
            } => Variable::Binned {
                values,
                axis: rename(&axis),
                dtype,
            },
            series => series,
        }
    }

    /// Keep only the timesteps at `indices`, in that order.
    pub(crate) fn select(&self, indices: &[usize]) -> Self {
        match self {
            Variable::Series { values, dtype } => Variable::Series {
                values: indices.iter().map(|&i| values[i]).collect(),
                dtype: *dtype,
            },
            Variable::Binned {
                values,
                axis,
                dtype,
            } => Variable::Binned {
                values: values.select(Axis(0), indices),
                axis: axis.clone(),
                dtype: *dtype,
            },
        }
    }

    /// Build a variable on a new time index, row `i` is taken from row `positions[i]` of `self`
    /// or is missing if that is `None`.
    pub(crate) fn reindex(&self, positions: &[Option<usize>]) -> Self {
        match self {
            Variable::Series { values, dtype } => Variable::Series {
                values: positions
                    .iter()
                    .map(|pos| pos.map_or_else(none, |i| values[i]))
                    .collect(),
                dtype: *dtype,
            },
            Variable::Binned {
                values,
                axis,
                dtype,
            } => Variable::Binned {
                values: Array2::from_shape_fn((positions.len(), values.ncols()), |(r, c)| {
                    positions[r].map_or(f64::NAN, |i| values[[i, c]])
                }),
                axis: axis.clone(),
                dtype: *dtype,
            },
        }
    }

    /// Combine two variables on the same time index. Wherever both have a value they must agree,
    /// otherwise the present value is taken. Returns `None` on any disagreement in kind, shape,
    /// axis or values.
    pub(crate) fn combine(&self, other: &Variable) -> Option<Variable> {
        match (self, other) {
            (
                Variable::Series { values: a, dtype },
                Variable::Series { values: b, .. },
            ) if a.len() == b.len() => {
                let values = izip!(a, b)
                    .map(|(&x, &y)| combine_values(x.unpack(), y.unpack()).map(some))
                    .collect::<Option<Vec<_>>>()?;

                Some(Variable::Series {
                    values,
                    dtype: *dtype,
                })
            }
            (
                Variable::Binned {
                    values: a,
                    axis,
                    dtype,
                },
                Variable::Binned {
                    values: b,
                    axis: other_axis,
                    ..
                },
            ) if a.dim() == b.dim() && axis == other_axis => {
                let values = izip!(a.iter(), b.iter())
                    .map(|(&x, &y)| combine_values(x, y))
                    .collect::<Option<Vec<_>>>()?;
                let values = Array2::from_shape_vec(a.dim(), values).ok()?;

                Some(Variable::Binned {
                    values,
                    axis: axis.clone(),
                    dtype: *dtype,
                })
            }
            _ => None,
        }
    }
}

/// Whether two float slices are equal, treating NaN as equal to NaN.
pub(crate) fn same_values(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && izip!(a, b).all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
}

#[inline]
fn combine_values(x: f64, y: f64) -> Option<f64> {
    if x.is_nan() {
        Some(y)
    } else if y.is_nan() || x == y {
        Some(x)
    } else {
        None
    }
}

use std::path::Path;

use log::debug;
use ndarray::Array2;
use netcdf::{
    types::{FloatType, IntType, NcVariableType},
    AttributeValue, Variable as NcVariable,
};
use optional::some;

use super::{cf, DatasetReader};
use crate::{
    dataset::{DType, Dataset, SiteInfo, Variable},
    error::{AnalysisError, Result},
};

/// Reads one of the archive's NetCDF files.
///
/// The file must have a `time` coordinate with CF units. Scalar `lat` and `lon` variables become
/// the site location, 1-D variables along `time` become series, 2-D `(time, bin)` variables
/// become binned variables, and any other 1-D variable is registered as a bin-center vector
/// under its own name. Binned variables use the name of their bin dimension as their axis, so
/// the file must carry a coordinate variable for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetcdfReader;

impl DatasetReader for NetcdfReader {
    fn read(&self, path: &Path) -> Result<Dataset> {
        let file = netcdf::open(path)?;
        let read_error = |reason: &str| AnalysisError::Read {
            path: path.to_path_buf(),
            reason: reason.to_owned(),
        };

        let time_var = file
            .variable("time")
            .ok_or_else(|| read_error("no time variable"))?;
        let units = match time_var.attribute_value("units") {
            Some(value) => match value? {
                AttributeValue::Str(units) => units,
                _ => return Err(read_error("time units are not a string")),
            },
            None => return Err(read_error("time has no units")),
        };
        let units = cf::TimeUnits::parse(&units).ok_or_else(|| read_error("bad time units"))?;
        let time = time_var
            .get_values::<f64, _>(..)?
            .into_iter()
            .map(|offset| units.datetime(offset))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| read_error("time out of range"))?;

        let lat = scalar(&file, "lat")?;
        let lon = scalar(&file, "lon")?;
        let location = lat.and_then(|lat| lon.map(|lon| (lat, lon)));

        let mut ds = Dataset::new(time).with_site_info(SiteInfo::new().with_lat_lon(location));

        // Axes must be registered before the distributions that use them.
        let mut binned = vec![];
        for var in file.variables() {
            let name = var.name();
            if name == "time" || name == "lat" || name == "lon" {
                continue;
            }

            let dims: Vec<(String, usize)> = var
                .dimensions()
                .iter()
                .map(|d| (d.name(), d.len()))
                .collect();

            match dims.as_slice() {
                [(dim, _)] if dim == "time" => {
                    let values = read_unpacked(&var)?.into_iter().map(some).collect();
                    let series = Variable::series(values).with_dtype(dtype(&var));
                    ds = ds.with_variable(name, series)?;
                }
                [_] => {
                    ds = ds.with_bin_centers(name, read_unpacked(&var)?)?;
                }
                [(dim, rows), (axis, cols)] if dim == "time" => {
                    let values = Array2::from_shape_vec((*rows, *cols), read_unpacked(&var)?)
                        .map_err(|err| read_error(&err.to_string()))?;
                    binned.push((
                        name,
                        Variable::binned(values, axis.as_str()).with_dtype(dtype(&var)),
                    ));
                }
                _ => debug!("skipping {} with dimensions {:?}", name, dims),
            }
        }

        for (name, var) in binned {
            ds = ds.with_variable(name, var)?;
        }

        Ok(ds)
    }
}

fn scalar(file: &netcdf::File, name: &str) -> Result<Option<f64>> {
    match file.variable(name) {
        Some(var) => Ok(read_unpacked(&var)?
            .first()
            .copied()
            .filter(|v| !v.is_nan())),
        None => Ok(None),
    }
}

fn read_unpacked(var: &NcVariable) -> Result<Vec<f64>> {
    let raw = var.get_values::<f64, _>(..)?;

    Ok(cf::unpack(
        raw,
        number_attribute(var, "_FillValue")?,
        number_attribute(var, "scale_factor")?,
        number_attribute(var, "add_offset")?,
    ))
}

fn number_attribute(var: &NcVariable, name: &str) -> Result<Option<f64>> {
    use AttributeValue::*;

    let value = match var.attribute_value(name) {
        Some(value) => value?,
        None => return Ok(None),
    };

    Ok(match value {
        Uchar(v) => Some(f64::from(v)),
        Schar(v) => Some(f64::from(v)),
        Ushort(v) => Some(f64::from(v)),
        Short(v) => Some(f64::from(v)),
        Uint(v) => Some(f64::from(v)),
        Int(v) => Some(f64::from(v)),
        Ulonglong(v) => Some(v as f64),
        Longlong(v) => Some(v as f64),
        Float(v) => Some(f64::from(v)),
        Double(v) => Some(v),
        _ => None,
    })
}

fn dtype(var: &NcVariable) -> DType {
    match var.vartype() {
        NcVariableType::Float(FloatType::F32) => DType::F32,
        NcVariableType::Int(IntType::I8) => DType::I8,
        NcVariableType::Int(IntType::I16) => DType::I16,
        NcVariableType::Int(IntType::I32) => DType::I32,
        NcVariableType::Int(IntType::I64) => DType::I64,
        NcVariableType::Int(IntType::U8) => DType::U8,
        NcVariableType::Int(IntType::U16) => DType::U16,
        NcVariableType::Int(IntType::U32) => DType::U32,
        NcVariableType::Int(IntType::U64) => DType::U64,
        _ => DType::F64,
    }
}

//! Registry of named tunable scalars.
//!
//! A [`ParamSet`] binds an ordered list of named fields to three interchange
//! surfaces: a plain `f64` vector for the optimizer, a gray-coded bit
//! string for population-based tuners, and a line-oriented text file.
//! Values are kept non-negative and below each field's effective maximum;
//! negative tuned values are not representable in the bit-string format and
//! must be encoded by the caller (for instance with a fixed offset).

use crate::error::{Result, TuningError};
use log::warn;
use std::fmt;
use std::fs;
use std::path::Path;
use tamarin_core::utils::bits::{gray_decode, gray_encode};

/// Terminates parsing when found on a line of a parameters file.
const END_OF_FILE_TOKEN: &str = "#EoF!";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F64(f64),
    Char(char),
}

impl ParamValue {
    /// Width of the native representation in bits.
    pub const fn native_bits(self) -> u32 {
        match self {
            ParamValue::Bool(_) => 1,
            ParamValue::U8(_) => 8,
            ParamValue::U16(_) => 16,
            ParamValue::U32(_) => 32,
            ParamValue::U64(_) => 64,
            ParamValue::F64(_) => 64,
            ParamValue::Char(_) => 32,
        }
    }

    fn native_max(self) -> f64 {
        match self {
            ParamValue::Bool(_) => 1.0,
            ParamValue::U8(_) => u8::MAX as f64,
            ParamValue::U16(_) => u16::MAX as f64,
            ParamValue::U32(_) => u32::MAX as f64,
            ParamValue::U64(_) => u64::MAX as f64,
            ParamValue::F64(_) => f64::MAX,
            ParamValue::Char(_) => char::MAX as u32 as f64,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            ParamValue::Bool(v) => v as u8 as f64,
            ParamValue::U8(v) => v as f64,
            ParamValue::U16(v) => v as f64,
            ParamValue::U32(v) => v as f64,
            ParamValue::U64(v) => v as f64,
            ParamValue::F64(v) => v,
            ParamValue::Char(v) => v as u32 as f64,
        }
    }

    /// Raw bit pattern fed to the gray codec at full native width. Floats
    /// use their IEEE-754 bits; a float under a sub-native bit limit is
    /// quantized instead (see [`Param::tunable_bits`]), since truncating
    /// an IEEE pattern would scramble the value.
    fn raw_bits(self) -> u64 {
        match self {
            ParamValue::Bool(v) => v as u64,
            ParamValue::U8(v) => v as u64,
            ParamValue::U16(v) => v as u64,
            ParamValue::U32(v) => v as u64,
            ParamValue::U64(v) => v,
            ParamValue::F64(v) => v.to_bits(),
            ParamValue::Char(v) => v as u64,
        }
    }

    fn with_f64(self, value: f64) -> ParamValue {
        match self {
            ParamValue::Bool(_) => ParamValue::Bool(value >= 0.5),
            ParamValue::U8(_) => ParamValue::U8(value as u8),
            ParamValue::U16(_) => ParamValue::U16(value as u16),
            ParamValue::U32(_) => ParamValue::U32(value as u32),
            ParamValue::U64(_) => ParamValue::U64(value as u64),
            ParamValue::F64(_) => ParamValue::F64(value),
            ParamValue::Char(_) => {
                ParamValue::Char(char::from_u32(value as u32).unwrap_or('\0'))
            }
        }
    }

    fn with_raw_bits(self, raw: u64) -> Result<ParamValue> {
        match self {
            ParamValue::Bool(_) => Ok(ParamValue::Bool(raw != 0)),
            ParamValue::U8(_) => u8::try_from(raw)
                .map(ParamValue::U8)
                .map_err(|_| width_error(raw, "u8")),
            ParamValue::U16(_) => u16::try_from(raw)
                .map(ParamValue::U16)
                .map_err(|_| width_error(raw, "u16")),
            ParamValue::U32(_) => u32::try_from(raw)
                .map(ParamValue::U32)
                .map_err(|_| width_error(raw, "u32")),
            ParamValue::U64(_) => Ok(ParamValue::U64(raw)),
            ParamValue::F64(_) => {
                let value = f64::from_bits(raw);
                if value.is_finite() && value >= 0.0 {
                    Ok(ParamValue::F64(value))
                } else {
                    Err(TuningError::Format(format!(
                        "bit pattern {:#x} is not a non-negative float",
                        raw
                    )))
                }
            }
            ParamValue::Char(_) => u32::try_from(raw)
                .ok()
                .and_then(char::from_u32)
                .map(ParamValue::Char)
                .ok_or_else(|| width_error(raw, "char")),
        }
    }

    fn parse_as(self, text: &str) -> Result<ParamValue> {
        fn parse_error(text: &str) -> TuningError {
            TuningError::Format(format!("cannot parse {:?} as field value", text))
        }
        match self {
            ParamValue::Bool(_) => match text.to_ascii_lowercase().as_str() {
                "true" => Ok(ParamValue::Bool(true)),
                "false" => Ok(ParamValue::Bool(false)),
                _ => Err(TuningError::Format(format!("invalid bool: {:?}", text))),
            },
            ParamValue::U8(_) => text.parse().map(ParamValue::U8).map_err(|_| parse_error(text)),
            ParamValue::U16(_) => text.parse().map(ParamValue::U16).map_err(|_| parse_error(text)),
            ParamValue::U32(_) => text.parse().map(ParamValue::U32).map_err(|_| parse_error(text)),
            ParamValue::U64(_) => text.parse().map(ParamValue::U64).map_err(|_| parse_error(text)),
            ParamValue::F64(_) => text.parse().map(ParamValue::F64).map_err(|_| parse_error(text)),
            ParamValue::Char(_) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(ParamValue::Char(c)),
                    _ => Err(TuningError::Format(format!("invalid char: {:?}", text))),
                }
            }
        }
    }
}

fn width_error(raw: u64, kind: &str) -> TuningError {
    TuningError::Format(format!("value {} does not fit in {}", raw, kind))
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::U8(v) => write!(f, "{}", v),
            ParamValue::U16(v) => write!(f, "{}", v),
            ParamValue::U32(v) => write!(f, "{}", v),
            ParamValue::U64(v) => write!(f, "{}", v),
            ParamValue::F64(v) => write!(f, "{}", v),
            ParamValue::Char(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone)]
struct Param {
    name: String,
    /// Bits consumed in the gray-code string; 0 excludes the field from
    /// tuning entirely.
    bit_limit: u32,
    value: ParamValue,
}

impl Param {
    fn effective_bits(&self) -> u32 {
        if self.bit_limit == 0 {
            self.value.native_bits()
        } else {
            self.bit_limit
        }
    }

    fn max_value(&self) -> f64 {
        let bits = self.effective_bits();
        let cap = if bits >= 64 {
            u64::MAX as f64
        } else {
            ((1u64 << bits) - 1) as f64
        };
        cap.min(self.value.native_max())
    }

    /// Bit pattern entering the gray-code string. A float held under a
    /// sub-native bit limit is quantized to the nearest integer in
    /// `[0, max]`, which fits the allotted bits exactly; all other kinds
    /// (and full-width floats) use the native pattern, whose dropped high
    /// bits are zero because the value is clamped below `2^limit`.
    fn tunable_bits(&self) -> u64 {
        match self.value {
            ParamValue::F64(v) if self.bit_limit < 64 => v.round() as u64,
            value => value.raw_bits(),
        }
    }

    /// Inverse of [`tunable_bits`] for a gray-decoded pattern.
    ///
    /// [`tunable_bits`]: Param::tunable_bits
    fn decode_tunable_bits(&self, raw: u64) -> Result<ParamValue> {
        match self.value {
            ParamValue::F64(_) if self.bit_limit < 64 => Ok(ParamValue::F64(raw as f64)),
            value => value.with_raw_bits(raw),
        }
    }
}

/// Ordered, named collection of tunable scalar fields.
#[derive(Debug, Clone, Default)]
pub struct ParamSet {
    params: Vec<Param>,
}

impl ParamSet {
    pub fn new() -> Self {
        ParamSet { params: Vec::new() }
    }

    /// Register a field. `bit_limit` of `None` uses the native width;
    /// `Some(0)` keeps the field out of the gray-code string.
    pub fn push(
        &mut self,
        name: &str,
        value: ParamValue,
        bit_limit: Option<u32>,
    ) -> Result<&mut Self> {
        if self.params.iter().any(|p| p.name == name) {
            return Err(TuningError::InvalidArgument(format!(
                "duplicate parameter name: {}",
                name
            )));
        }
        let limit = bit_limit.unwrap_or(0);
        if limit > value.native_bits() {
            return Err(TuningError::InvalidArgument(format!(
                "bit limit {} exceeds native width of {}",
                limit, name
            )));
        }
        let mut param = Param {
            name: name.to_string(),
            bit_limit: bit_limit.unwrap_or(value.native_bits()),
            value,
        };
        // Registered values must already sit inside [0, max].
        param.value = value.with_f64(value.as_f64().clamp(0.0, param.max_value()));
        self.params.push(param);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.params.iter().find(|p| p.name == name).map(|p| p.value)
    }

    /// Current values as a float vector; booleans map to 0/1.
    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.value.as_f64()).collect()
    }

    /// Per-field upper bounds from the data kind and bit-limit annotation.
    pub fn max_values(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.max_value()).collect()
    }

    /// Write back a float vector, clamping each component into
    /// `[0, max_i]`. Extra components are ignored; a short vector leaves
    /// the tail untouched.
    pub fn set_values(&mut self, values: &[f64]) {
        for (param, &value) in self.params.iter_mut().zip(values.iter()) {
            let clamped = value.clamp(0.0, param.max_value());
            param.value = param.value.with_f64(clamped);
        }
    }

    /// Concatenation of each field's gray-encoded bits, most significant
    /// first, truncated to the field's bit limit. Zero-limit fields are
    /// skipped; bit-limited floats are quantized to integers first.
    pub fn to_gray_string(&self) -> String {
        let mut out = String::new();
        for param in &self.params {
            if param.bit_limit == 0 {
                continue;
            }
            let gray = gray_encode(param.tunable_bits());
            for bit in (0..param.bit_limit).rev() {
                out.push(if (gray >> bit) & 1 == 1 { '1' } else { '0' });
            }
        }
        out
    }

    /// Inverse of [`to_gray_string`]: consume each field's allotted bits,
    /// gray-decode and store, width-checking against the native type.
    ///
    /// [`to_gray_string`]: ParamSet::to_gray_string
    pub fn set_gray_string(&mut self, bits: &str) -> Result<()> {
        let expected: u32 = self
            .params
            .iter()
            .map(|p| p.bit_limit)
            .sum();
        if bits.len() != expected as usize {
            return Err(TuningError::Format(format!(
                "expected {} bits, got {}",
                expected,
                bits.len()
            )));
        }

        let mut decoded = Vec::with_capacity(self.params.len());
        let mut cursor = bits.chars();
        for param in &self.params {
            if param.bit_limit == 0 {
                decoded.push(param.value);
                continue;
            }
            let mut gray = 0u64;
            for _ in 0..param.bit_limit {
                let bit = match cursor.next() {
                    Some('0') => 0,
                    Some('1') => 1,
                    other => {
                        return Err(TuningError::Format(format!(
                            "invalid bit character: {:?}",
                            other
                        )))
                    }
                };
                gray = (gray << 1) | bit;
            }
            decoded.push(param.decode_tunable_bits(gray_decode(gray))?);
        }

        for (param, value) in self.params.iter_mut().zip(decoded) {
            param.value = value;
        }
        Ok(())
    }

    /// Read `[name] = value` lines. Unknown names and malformed lines are
    /// logged and skipped; a line containing `#EoF!` ends parsing. Returns
    /// whether at least one field was set.
    pub fn load_from<P: AsRef<Path>>(&mut self, path: P) -> Result<bool> {
        let contents = fs::read_to_string(path)?;
        let mut any_set = false;

        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.contains(END_OF_FILE_TOKEN) {
                break;
            }
            if line.is_empty() {
                continue;
            }
            let parsed = line
                .strip_prefix('[')
                .and_then(|rest| rest.split_once("] = "));
            let Some((name, value_text)) = parsed else {
                warn!("skipping malformed parameter line: {:?}", line);
                continue;
            };
            let Some(param) = self.params.iter_mut().find(|p| p.name == name) else {
                warn!("skipping unknown parameter: {:?}", name);
                continue;
            };
            match param.value.parse_as(value_text.trim()) {
                Ok(value) => {
                    param.value = value;
                    any_set = true;
                }
                Err(err) => warn!("skipping parameter {:?}: {}", name, err),
            }
        }
        Ok(any_set)
    }

    /// Write every field as a `[name] = value` line followed by the
    /// terminator token.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = String::new();
        for param in &self.params {
            out.push_str(&format!("[{}] = {}\n", param.name, param.value));
        }
        out.push_str(END_OF_FILE_TOKEN);
        out.push('\n');
        fs::write(path, out)?;
        Ok(())
    }
}

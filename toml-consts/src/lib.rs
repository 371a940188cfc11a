//! Turns a table of typed TOML values into Rust `pub const` items at build time.
//!
//! ```toml
//! [SENTINEL_BACKGROUND]
//! type = "u8"
//! value = [205, 205, 205]
//! ```

use std::{collections::BTreeMap, fmt::Write};

use serde::Deserialize;

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConstType {
	Bool,
	F32,
	F64,
	I32,
	U8,
	U32,
	U64,
}
impl ConstType {
	fn rust_name(self) -> &'static str {
		match self {
			ConstType::Bool => "bool",
			ConstType::F32 => "f32",
			ConstType::F64 => "f64",
			ConstType::I32 => "i32",
			ConstType::U8 => "u8",
			ConstType::U32 => "u32",
			ConstType::U64 => "u64",
		}
	}

	/// Renders a single scalar as a Rust literal, or `None` if it doesn't fit the type
	fn literal(self, value: &toml::Value) -> Option<String> {
		use toml::Value;

		Some(match (self, value) {
			(ConstType::Bool, Value::Boolean(b)) => b.to_string(),

			(ConstType::F32, Value::Float(f)) => format!("{:?}", *f as f32),
			(ConstType::F32, Value::Integer(i)) => format!("{:?}", *i as f32),
			(ConstType::F64, Value::Float(f)) => format!("{f:?}"),
			(ConstType::F64, Value::Integer(i)) => format!("{:?}", *i as f64),

			(ConstType::I32, Value::Integer(i)) => i32::try_from(*i).ok()?.to_string(),
			(ConstType::U8, Value::Integer(i)) => u8::try_from(*i).ok()?.to_string(),
			(ConstType::U32, Value::Integer(i)) => u32::try_from(*i).ok()?.to_string(),
			(ConstType::U64, Value::Integer(i)) => u64::try_from(*i).ok()?.to_string(),

			_ => return None,
		})
	}
}

#[derive(Deserialize, Clone, Debug)]
struct RawConst {
	#[serde(rename = "type")]
	ty: ConstType,
	value: toml::Value,
}

/// A constant whose value has already been checked against its declared type
#[derive(Clone, Debug)]
struct Const {
	ty: ConstType,
	literals: Vec<String>,
	array: bool,
}
impl Const {
	fn check(name: &str, raw: RawConst) -> Result<Self, toml::de::Error> {
		let invalid = || <toml::de::Error as serde::de::Error>::custom(format!("{name}: value is not a valid {}", raw.ty.rust_name()));

		match &raw.value {
			toml::Value::Array(items) => Ok(Const {
				ty: raw.ty,
				literals: items.iter().map(|item| raw.ty.literal(item).ok_or_else(invalid)).collect::<Result<_, _>>()?,
				array: true,
			}),

			scalar => Ok(Const {
				ty: raw.ty,
				literals: vec![raw.ty.literal(scalar).ok_or_else(invalid)?],
				array: false,
			}),
		}
	}

	fn write_item<W: Write>(&self, name: &str, w: &mut W) -> std::fmt::Result {
		let ty = self.ty.rust_name();
		if self.array {
			writeln!(w, "pub const {name}: [{ty}; {}] = [{}];", self.literals.len(), self.literals.join(", "))
		} else {
			writeln!(w, "pub const {name}: {ty} = {};", self.literals[0])
		}
	}
}

/// Parsed constants, emitted in name order
#[derive(Clone, Debug)]
pub struct TomlConsts(BTreeMap<String, Const>);
impl TomlConsts {
	pub fn serialize_rust<W: Write>(&self, w: &mut W) -> std::fmt::Result {
		for (name, item) in &self.0 {
			item.write_item(name, w)?;
		}
		Ok(())
	}
}

pub fn from_str(src: &str) -> Result<TomlConsts, toml::de::Error> {
	let raw: BTreeMap<String, RawConst> = toml::from_str(src)?;
	raw.into_iter()
		.map(|(name, raw)| Const::check(&name, raw).map(|item| (name, item)))
		.collect::<Result<_, _>>()
		.map(TomlConsts)
}

#[test]
fn test_serialize_rust() {
	let consts = from_str(r#"
		[THRESHOLD]
		type = "f32"
		value = 0.9

		[FILL]
		type = "u8"
		value = [205, 205, 205]

		[ENABLED]
		type = "bool"
		value = true
	"#).unwrap();

	let mut rs = String::new();
	consts.serialize_rust(&mut rs).unwrap();

	assert_eq!(rs, "pub const ENABLED: bool = true;\npub const FILL: [u8; 3] = [205, 205, 205];\npub const THRESHOLD: f32 = 0.9;\n");
}

#[test]
fn test_rejects_mismatched_value() {
	assert!(from_str("[WIDTH]\ntype = \"u8\"\nvalue = 300\n").is_err());
	assert!(from_str("[FLAG]\ntype = \"bool\"\nvalue = [1]\n").is_err());
	assert!(from_str("[ODD]\ntype = \"i16\"\nvalue = 1\n").is_err());
}

fn main() {
	println!("cargo:rerun-if-changed=build.rs");
	println!("cargo:rerun-if-changed=src/consts/consts.toml");

	let toml_consts = toml_consts::from_str(include_str!("src/consts/consts.toml")).unwrap();

	let mut rs = String::new();
	toml_consts.serialize_rust(&mut rs).unwrap();

	let out_dir = std::path::PathBuf::from(std::env::var_os("OUT_DIR").unwrap());
	std::fs::write(out_dir.join("consts.rs"), rs).unwrap();
}

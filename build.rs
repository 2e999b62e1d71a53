//! Build script to embed Windows resource metadata into the executable
//! This sets the application name shown in Task Manager

fn main() {
    #[cfg(windows)]
    {
        let mut res = winresource::WindowsResource::new();

        res.set("ProductName", "FreeCrosshair");
        res.set("FileDescription", "FreeCrosshair");
        res.set("InternalName", "FreeCrosshair");
        res.set("OriginalFilename", "free_crosshair.exe");
        res.set("CompanyName", "FreeCrosshair");
        res.set("LegalCopyright", "Copyright © 2026");
        res.set("ProductVersion", env!("CARGO_PKG_VERSION"));
        res.set("FileVersion", env!("CARGO_PKG_VERSION"));

        if let Err(e) = res.compile() {
            println!("cargo:warning=Failed to compile Windows resources: {}", e);
        }
    }
}

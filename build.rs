//! Embeds the Windows application manifest.
//!
//! Stock Windows caps paths at 260 characters (MAX_PATH), which deep
//! serving roots overrun easily. `dirserve.manifest` declares
//! `longPathAware=true`, which together with the Windows 10 v1607+
//! registry opt-in raises the cap to 32,767 characters. There is no
//! resource step on other platforms.

fn main() {
    #[cfg(windows)]
    {
        // The .rc wraps the manifest as an RT_MANIFEST resource.
        embed_resource::compile("dirserve.rc", embed_resource::NONE);

        println!("cargo:rerun-if-changed=dirserve.rc");
        println!("cargo:rerun-if-changed=dirserve.manifest");
    }
}

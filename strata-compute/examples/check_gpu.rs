//! Quick GPU check utility
use strata_compute::{device_info, gpu_available};
use strata_core::grid::GridShape;

fn main() {
    println!("=== Strata GPU Check ===\n");
    println!("GPU Available: {}", gpu_available());
    println!("\nDevices found:");
    for device in device_info() {
        println!("  🎮 {} ", device.name);
        println!("     Vendor: {}", device.vendor);
        println!("     Type: {}", device.device_type);
        println!("     Backend: {}", device.backend);
        println!("     Max buffer: {} MB", device.max_buffer_size / 1024 / 1024);

        // Deepest history a 1000x1000 grid could keep on this device
        if let Ok(shape) = GridShape::new(1000, 1000, 1) {
            let depth = device.max_buffer_size / shape.layer_stride_bytes() as u64;
            println!("     1000x1000 history: {} generations", (2 * depth).saturating_sub(1));
        }
        println!();
    }
}

use beatclockrs::{
    cli::{validate_device, Args},
    create_scheduler, handle_device_list,
    input::ConsoleInput,
    logging,
    midi::{output_port_names, ClockOutput, MidirClockOutput, MidirInput},
    ui::TerminalDisplay,
    AppConfig, ClockEngine, ControlSurface, EventLoop, FileStorage, ThreadTimer,
};
use clap::Parser;
use dialoguer::Select;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

fn main() {
    let args = Args::parse();
    let config = match AppConfig::load(&args) {
        Ok(config) => config,
        Err(e) => exit_with_error(&format!("Invalid configuration: {}", e)),
    };
    initialize_logging(&config);

    if args.list_devices {
        list_available_devices(&handle_device_list());
        return;
    }

    let output_device = resolve_output_device(&config);
    let clock_output = connect_clock_output(output_device.as_deref());
    let midi_input = match MidirInput::connect(config.midi_input.as_deref()) {
        Ok(input) => input,
        Err(e) => exit_with_error(&format!("Error connecting to MIDI input: {}", e)),
    };

    // Without a working timer there is no clock to generate.
    let engine = match ClockEngine::new(ThreadTimer::new(), clock_output) {
        Ok(engine) => engine,
        Err(e) => exit_with_error(&format!("Clock initialization failed: {}", e)),
    };

    let surface = ControlSurface::new(
        engine,
        FileStorage::new(&config.settings_path),
        midi_input,
        TerminalDisplay::new(),
        config.short_press,
    );

    let scheduler = create_scheduler();
    let input = ConsoleInput::spawn(&scheduler);

    eprintln!("Controls: '+'/'-' or '+N'/'-N' turn the knob, 'c' click, 'l' long press");
    log::info!("Application running");
    EventLoop::new(surface, input, config.poll_interval).run(&SHUTDOWN);
}

fn initialize_logging(config: &AppConfig) {
    if let Err(e) = logging::init_logger(config.log_level) {
        logging::init_fallback_logger(config.log_level);
        log::warn!("File logging unavailable, logging to stderr: {}", e);
    }
    log::info!("Application starting");
}

fn exit_with_error(message: &str) -> ! {
    log::error!("{}", message);
    eprintln!("{}", message);
    std::process::exit(1);
}

fn list_available_devices(devices: &[String]) {
    println!("Available MIDI devices:");
    for device in devices {
        println!("  - {}", device);
    }
}

fn resolve_output_device(config: &AppConfig) -> Option<String> {
    let ports = output_port_names();

    if config.select_device {
        if ports.is_empty() {
            exit_with_error("No MIDI output ports available");
        }
        return match Select::new()
            .with_prompt("MIDI output for the clock")
            .items(&ports)
            .default(0)
            .interact()
        {
            Ok(index) => Some(ports[index].clone()),
            Err(e) => exit_with_error(&format!("Device selection failed: {}", e)),
        };
    }

    if let Some(device_name) = &config.midi_output {
        if let Err(error_msg) = validate_device(device_name, &ports) {
            exit_with_error(&error_msg);
        }
    }
    config.midi_output.clone()
}

fn connect_clock_output(device_name: Option<&str>) -> Arc<dyn ClockOutput> {
    match MidirClockOutput::connect(device_name) {
        Ok(output) => {
            log::info!("Clock output on {}", output.port_name());
            println!("Sending MIDI clock to {}", output.port_name());
            Arc::new(output)
        }
        Err(e) => exit_with_error(&format!("Error connecting to MIDI device: {}", e)),
    }
}

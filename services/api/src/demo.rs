use crate::infra::{
    parse_coordinate, parse_punch, DeviceScript, DryRunAttendanceApi, SimulatedDevice,
};
use clap::Args;
use fitbuddy_attendance::config::AppConfig;
use fitbuddy_attendance::error::AppError;
use fitbuddy_attendance::telemetry;
use fitbuddy_attendance::workflows::attendance::{
    distance_meters, is_within_radius, AttendanceApi, AttendanceOrchestrator, AttendancePolicy,
    AttendanceReport, BiometricSensor, BiometricService, BranchRoster, Coordinate,
    EmployeeSession, HttpAttendanceApi, LocationService, PermissionStatus, PlatformInfo,
    PunchType, SystemClock, TokioDelay,
};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DEMO_ROSTER: &str = "id,name,lat,lng\n\
salt-lake,Salt Lake Sector V,22.5739500,88.3066500\n\
howrah,Howrah Maidan,22.5958,88.2636\n";

#[derive(Args, Debug)]
pub(crate) struct DistanceArgs {
    /// First point as LAT,LNG
    #[arg(long, value_parser = parse_coordinate)]
    pub(crate) from: Coordinate,
    /// Second point as LAT,LNG
    #[arg(long, value_parser = parse_coordinate)]
    pub(crate) to: Coordinate,
    /// Also report whether `from` lies within this many meters of `to`
    #[arg(long)]
    pub(crate) radius: Option<f64>,
}

#[derive(Args, Debug)]
pub(crate) struct AttendArgs {
    /// Simulated employee position as LAT,LNG
    #[arg(long, value_parser = parse_coordinate)]
    pub(crate) at: Coordinate,
    /// Branch roster CSV (id,name,lat,lng). Defaults to the built-in demo roster.
    #[arg(long)]
    pub(crate) branches: Option<PathBuf>,
    /// Employee id sent as emp_id
    #[arg(long, default_value_t = 1)]
    pub(crate) emp_id: i64,
    /// Punch direction: in or out
    #[arg(long, value_parser = parse_punch, default_value = "in")]
    pub(crate) punch: PunchType,
    /// Simulate an iOS handset instead of Android
    #[arg(long)]
    pub(crate) ios: bool,
    /// Android API level (or iOS major version with --ios)
    #[arg(long, default_value_t = 33)]
    pub(crate) os_version: u32,
    /// Number of acquisition requests that time out before the device answers
    #[arg(long, default_value_t = 0)]
    pub(crate) failed_fixes: u32,
    /// Simulate the user denying location permission
    #[arg(long)]
    pub(crate) deny_permission: bool,
    /// Simulate device location services being switched off
    #[arg(long)]
    pub(crate) services_disabled: bool,
    /// Require a biometric prompt before locating
    #[arg(long)]
    pub(crate) biometric: bool,
    /// Override the configured geofence radius in meters
    #[arg(long)]
    pub(crate) radius: Option<f64>,
    /// Send the punch to the configured attendance API instead of a dry run
    #[arg(long)]
    pub(crate) submit: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Android API level for the simulated handset
    #[arg(long, default_value_t = 33)]
    pub(crate) os_version: u32,
}

pub(crate) fn run_distance(args: DistanceArgs) -> Result<(), AppError> {
    let distance = distance_meters(args.from, args.to);
    println!("{} -> {}: {:.2} m", args.from, args.to, distance);

    if let Some(radius) = args.radius {
        let verdict = if is_within_radius(args.from, args.to, radius) {
            "inside"
        } else {
            "outside"
        };
        println!("{verdict} the {radius} m radius");
    }
    Ok(())
}

pub(crate) async fn run_attend(args: AttendArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let roster = match &args.branches {
        Some(path) => BranchRoster::from_path(path)?,
        None => BranchRoster::from_reader(Cursor::new(DEMO_ROSTER))?,
    };
    let session = EmployeeSession {
        user_id: args.emp_id,
        branches: roster.into_raw(),
    };

    let info = if args.ios {
        PlatformInfo::ios(args.os_version)
    } else {
        PlatformInfo::android(args.os_version)
    };
    let device = SimulatedDevice::new(DeviceScript {
        info,
        position: args.at,
        permission: if args.deny_permission {
            PermissionStatus::Denied
        } else {
            PermissionStatus::Granted
        },
        services_enabled: !args.services_disabled,
        failed_fixes: args.failed_fixes,
        biometric_sensor: Some(BiometricSensor::Biometrics),
    });

    let mut policy = AttendancePolicy::from(&config.attendance);
    if let Some(radius) = args.radius {
        policy.radius_meters = radius;
    }

    let api: Arc<dyn AttendanceApi> = if args.submit {
        Arc::new(HttpAttendanceApi::new(
            &config.attendance.api_base_url,
            config.attendance.http_timeout,
        )?)
    } else {
        Arc::new(DryRunAttendanceApi::default())
    };

    let mut orchestrator = AttendanceOrchestrator::new(
        session,
        Arc::new(LocationService::new(device.bridge())),
        api,
        Arc::new(TokioDelay),
        Arc::new(SystemClock),
        policy,
    )?;
    if args.biometric || config.attendance.require_biometric {
        let biometrics = BiometricService::new(info.kind, device.clone());
        orchestrator = orchestrator.with_biometrics(Arc::new(biometrics));
    }

    println!("Check-in on {} at {}", info.device_name(), args.at);
    let report = orchestrator.run(args.punch).await;
    render_report(&report);
    for prompt in device.prompts() {
        println!("  Prompt shown: {}", prompt.title);
    }
    Ok(())
}

struct Scenario {
    title: &'static str,
    position: Coordinate,
    failed_fixes: u32,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let roster = BranchRoster::from_reader(Cursor::new(DEMO_ROSTER))?;
    let raw = roster.into_raw();
    let scenarios = [
        Scenario {
            title: "Employee at the Salt Lake branch",
            position: Coordinate::new(22.5738994, 88.3065939),
            failed_fixes: 0,
        },
        Scenario {
            title: "Employee two kilometres away",
            position: Coordinate::new(22.5918994, 88.3065939),
            failed_fixes: 0,
        },
        Scenario {
            title: "GPS fix only on the network-only strategy",
            position: Coordinate::new(22.5738994, 88.3065939),
            failed_fixes: 1,
        },
        Scenario {
            title: "Handset that never produces a fix",
            position: Coordinate::new(22.5738994, 88.3065939),
            failed_fixes: u32::MAX,
        },
    ];

    println!("Attendance check-in demo");
    for scenario in scenarios {
        let info = PlatformInfo::android(args.os_version);
        let device = SimulatedDevice::new(DeviceScript {
            info,
            position: scenario.position,
            permission: PermissionStatus::Granted,
            services_enabled: true,
            failed_fixes: scenario.failed_fixes,
            biometric_sensor: None,
        });
        let api = Arc::new(DryRunAttendanceApi::default());
        let policy = AttendancePolicy {
            retry_delay: Duration::ZERO,
            ..AttendancePolicy::default()
        };

        let orchestrator = AttendanceOrchestrator::new(
            EmployeeSession {
                user_id: 1001,
                branches: raw.clone(),
            },
            Arc::new(LocationService::new(device.bridge())),
            api.clone(),
            Arc::new(TokioDelay),
            Arc::new(SystemClock),
            policy,
        )?;

        println!("\n{} ({})", scenario.title, device.info().device_name());
        let report = orchestrator.run(PunchType::In).await;
        render_report(&report);
        println!("  Payloads submitted: {}", api.payloads().len());
    }
    Ok(())
}

fn render_report(report: &AttendanceReport) {
    let trail = report
        .trail
        .iter()
        .map(|state| state.label())
        .collect::<Vec<_>>()
        .join(" -> ");
    println!("- Outcome: {}", report.state.label());
    println!("  Trail: {trail}");
    println!("  Location attempts: {}", report.acquisition_attempts);

    if let Some(coordinate) = report.coordinate {
        println!("  Fix: {coordinate}");
    }
    if let Some(geofence) = &report.geofence {
        match &geofence.nearest_branch {
            Some(branch) => println!(
                "  Nearest branch: {} ({:.1} m, {})",
                branch.name,
                geofence.distance_meters,
                if geofence.within_radius {
                    "inside geofence"
                } else {
                    "outside geofence"
                }
            ),
            None => println!("  No branches configured"),
        }
    }
    if let Some(message) = &report.message {
        println!("  Message: {}", message.replace('\n', " "));
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("tube_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    use tube_engine::config::TubeConfig;
    use tube_engine::generator::TubeGenerator;
    use tube_engine::geom::{Point3, TubeCaps, TubeDiagnostics, TubeMesh, TubeOptions, generate_tube};
    use tube_engine::snapshot::{normalize_snapshot_text, tube_snapshot};

    const USAGE: &str = r#"tube_cli (tube-engine)

USAGE:
  tube_cli list
  tube_cli run <scenario|all> [options]

SCENARIOS:
  straight
  helix
  vertical
  hairpin
  smoothed_wave

OPTIONS (run):
  --out-dir <dir>    Write <scenario>.obj and/or <scenario>.snap to this dir (required for `all`)
  --obj <path>       Write OBJ (single scenario only)
  --snap <path>      Write golden-style snapshot (single scenario only)
  --no-obj           Skip OBJ when using --out-dir
  --no-snap          Skip snapshot when using --out-dir
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                for scenario in Scenario::ALL {
                    println!("{}", scenario.name());
                }
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut write_obj = true;
        let mut write_snap = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--overwrite" => overwrite = true,
                "--no-obj" => write_obj = false,
                "--no-snap" => write_snap = false,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --obj/--snap (not both)".to_string());
            }
            if !write_obj && !write_snap {
                return Err("nothing to write (both --no-obj and --no-snap set)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            let scenarios = if scenario_name == "all" {
                Scenario::ALL.to_vec()
            } else {
                vec![Scenario::from_name(&scenario_name).ok_or_else(|| unknown_scenario(&scenario_name))?]
            };
            for scenario in scenarios {
                let output = run_scenario(scenario)?;
                if write_snap {
                    let path = dir.join(format!("{}.snap", output.name));
                    write_text_file(&path, &output.snapshot, overwrite)?;
                    eprintln!("wrote {}", path.display());
                }
                if write_obj {
                    let path = dir.join(format!("{}.obj", output.name));
                    write_obj_file(&path, &output.mesh, output.name, overwrite)?;
                    eprintln!("wrote {}", path.display());
                }
                report(&output);
            }
            return Ok(());
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario =
            Scenario::from_name(&scenario_name).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario)?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &output.mesh, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        report(&output);
        Ok(())
    }

    fn report(output: &ScenarioOutput) {
        eprintln!("{}: {}", output.name, output.diagnostics.summary());
        if let Some(timing) = output.diagnostics.timing.as_ref() {
            eprintln!("{}: {:.3} ms", output.name, timing.total_ms());
        }
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = format!("unknown scenario `{name}`\n\navailable scenarios:\n");
        for scenario in Scenario::ALL {
            msg.push_str(&format!("  {}\n", scenario.name()));
        }
        msg
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn write_obj_file(path: &Path, mesh: &TubeMesh, name: &str, overwrite: bool) -> Result<(), String> {
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);
        let io = |e: std::io::Error| format!("write obj: {e}");

        writeln!(w, "# tube-engine tube_cli").map_err(io)?;
        writeln!(w, "o {name}").map_err(io)?;
        for p in &mesh.positions {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(io)?;
        }
        for uv in &mesh.uvs {
            writeln!(w, "vt {} {}", uv[0], uv[1]).map_err(io)?;
        }
        for n in &mesh.normals {
            writeln!(w, "vn {} {} {}", n[0], n[1], n[2]).map_err(io)?;
        }
        for tri in mesh.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
            writeln!(w, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}").map_err(io)?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        Straight,
        Helix,
        Vertical,
        Hairpin,
        SmoothedWave,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::Straight,
            Scenario::Helix,
            Scenario::Vertical,
            Scenario::Hairpin,
            Scenario::SmoothedWave,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::Straight => "straight",
                Scenario::Helix => "helix",
                Scenario::Vertical => "vertical",
                Scenario::Hairpin => "hairpin",
                Scenario::SmoothedWave => "smoothed_wave",
            }
        }

        fn from_name(name: &str) -> Option<Self> {
            Scenario::ALL.iter().copied().find(|s| s.name() == name)
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        mesh: TubeMesh,
        diagnostics: TubeDiagnostics,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario) -> Result<ScenarioOutput, String> {
        let name = scenario.name();
        let (mesh, diagnostics) = match scenario {
            Scenario::Straight => build(
                &[Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)],
                TubeOptions {
                    radius: 1.0,
                    circle_segments: 4,
                    caps: TubeCaps::BOTH,
                    ..TubeOptions::default()
                },
            )?,
            Scenario::Helix => {
                let controls: Vec<Point3> = (0..12)
                    .map(|i| {
                        let a = f64::from(i) * std::f64::consts::FRAC_PI_3;
                        Point3::new(2.0 * a.cos(), 0.4 * f64::from(i), 2.0 * a.sin())
                    })
                    .collect();
                build(
                    &controls,
                    TubeOptions {
                        radius: 0.25,
                        circle_segments: 16,
                        interpolation_steps: 8,
                        smoothness: 1.0,
                        ..TubeOptions::default()
                    },
                )?
            }
            Scenario::Vertical => build(
                &[
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(0.0, 2.0, 0.0),
                    Point3::new(0.5, 4.0, 0.0),
                ],
                TubeOptions {
                    radius: 0.2,
                    circle_segments: 8,
                    interpolation_steps: 6,
                    ..TubeOptions::default()
                },
            )?,
            Scenario::Hairpin => build(
                &[
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(2.0, 0.0, 0.0),
                    Point3::new(0.0, 0.0, 0.0),
                ],
                TubeOptions {
                    radius: 0.1,
                    circle_segments: 6,
                    interpolation_steps: 1,
                    ..TubeOptions::default()
                },
            )?,
            Scenario::SmoothedWave => smoothed_wave()?,
        };

        let snapshot = tube_snapshot(name, &mesh, &diagnostics);
        Ok(ScenarioOutput {
            name,
            mesh,
            diagnostics,
            snapshot,
        })
    }

    fn build(controls: &[Point3], options: TubeOptions) -> Result<(TubeMesh, TubeDiagnostics), String> {
        generate_tube(controls, &options).map_err(|e| e.to_string())
    }

    /// A wave whose phase advances every tick, fed through the smoothing
    /// controller for one simulated second.
    fn smoothed_wave() -> Result<(TubeMesh, TubeDiagnostics), String> {
        let config = TubeConfig {
            radius: 0.15,
            circle_segments: 10,
            interpolation_steps: 6,
            use_smooth_update: true,
            smoothing_factor: 0.7,
            ..TubeConfig::default()
        };
        let mut generator = TubeGenerator::new(config).map_err(|e| e.to_string())?;

        for tick in 0..60 {
            let phase = f64::from(tick) * 0.1;
            let controls: Vec<Point3> = (0..6)
                .map(|i| {
                    let x = f64::from(i);
                    Point3::new(x, (x + phase).sin(), 0.0)
                })
                .collect();
            generator.tick(1.0 / 60.0, &controls).map_err(|e| e.to_string())?;
        }

        let mesh = generator.mesh().ok_or("smoothed wave produced no mesh")?;
        let diagnostics = generator
            .diagnostics()
            .cloned()
            .ok_or("smoothed wave produced no diagnostics")?;
        Ok((TubeMesh::clone(&mesh), diagnostics))
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("mesh_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use afm_engine::geom::{
        AdvancingFrontDiagnostics, BoundaryLoop, FrontSnapshot, GeomMesh, GeomMeshDiagnostics,
        MeshOptions, Point3, Tolerance, Vec3, mesh_boundary_loops, mesh_from_panels,
    };
    use std::f64::consts::TAU;
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"mesh_cli (afm-engine)

USAGE:
  mesh_cli list
  mesh_cli run <scenario|all> [options]

SCENARIOS:
  unit_square
  square_with_hole
  near_triangle
  disc
  concave_notch
  rectangle

OPTIONS (run):
  --out-dir <dir>    Write <scenario>.obj and/or <scenario>.snap to this dir (required for `all`)
  --obj <path>       Write OBJ (single scenario only)
  --snap <path>      Write snapshot (single scenario only)
  --no-obj           Skip OBJ when using --out-dir
  --no-snap          Skip snapshot when using --out-dir
  --spacing <value>  Override the scenario's target spacing
  --debug            Include the front after every iteration in the snapshot
  --overwrite        Overwrite existing output files
  -v, --verbose      Log progress to stderr
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
                print_scenarios();
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

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{:<18} spacing {}", scenario.name(), scenario.default_spacing());
        }
    }

    // ── stderr logger ───────────────────────────────────────────────────────

    struct StderrLogger;

    static LOGGER: StderrLogger = StderrLogger;

    impl log::Log for StderrLogger {
        fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &log::Record<'_>) {
            if self.enabled(record.metadata()) {
                eprintln!("[{}] {}", record.level(), record.args());
            }
        }

        fn flush(&self) {}
    }

    fn init_logger(verbose: bool) {
        if !verbose {
            return;
        }
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Debug);
        }
    }

    // ── run ─────────────────────────────────────────────────────────────────

    #[derive(Debug, Clone, Copy, Default)]
    struct RunSettings {
        spacing: Option<f64>,
        debug: bool,
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut write_obj = true;
        let mut write_snap = true;
        let mut verbose = false;
        let mut settings = RunSettings::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--spacing" => {
                    let raw = args.value("--spacing")?;
                    let spacing = raw
                        .parse::<f64>()
                        .map_err(|e| format!("invalid --spacing `{raw}`: {e}"))?;
                    settings.spacing = Some(spacing);
                }
                "--debug" => settings.debug = true,
                "--overwrite" => overwrite = true,
                "--no-obj" => write_obj = false,
                "--no-snap" => write_snap = false,
                "-v" | "--verbose" => verbose = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        init_logger(verbose);

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --obj/--snap (not both)".to_string());
            }
            if !write_obj && !write_snap {
                return Err("nothing to write (both --no-obj and --no-snap set)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(
                        *scenario, settings, dir, write_obj, write_snap, overwrite,
                    )?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(
                scenario, settings, dir, write_obj, write_snap, overwrite,
            );
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario = Scenario::from_str(scenario_name.as_str())
            .ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario, settings)?;

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

        print_summary(&output);
        Ok(())
    }

    fn run_one_scenario_to_dir(
        scenario: Scenario,
        settings: RunSettings,
        dir: &Path,
        write_obj: bool,
        write_snap: bool,
        overwrite: bool,
    ) -> Result<(), String> {
        let output = run_scenario(scenario, settings)?;

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

        print_summary(&output);
        Ok(())
    }

    fn print_summary(output: &ScenarioOutput) {
        eprintln!(
            "{}: panels={} | {} | {}",
            output.name,
            output.mesh.triangle_count(),
            output.front_diag.summary(),
            output.mesh_diag.summary()
        );
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        let _ = writeln!(msg, "unknown scenario `{name}`\n\navailable scenarios:");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    // ── output files ────────────────────────────────────────────────────────

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text))
            .map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn write_obj_file(
        path: &Path,
        mesh: &GeomMesh,
        name: &str,
        overwrite: bool,
    ) -> Result<(), String> {
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# afm-engine mesh_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for p in mesh.positions.iter().copied() {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(|e| format!("write obj: {e}"))?;
        }

        if let Some(normals) = mesh.normals.as_ref() {
            for n in normals.iter().copied() {
                writeln!(w, "vn {} {} {}", n[0], n[1], n[2])
                    .map_err(|e| format!("write obj: {e}"))?;
            }
        }

        let has_normals = mesh.normals.is_some();
        for tri in mesh.indices.chunks_exact(3) {
            let a = tri[0] + 1;
            let b = tri[1] + 1;
            let c = tri[2] + 1;

            if has_normals {
                writeln!(w, "f {a}//{a} {b}//{b} {c}//{c}")
            } else {
                writeln!(w, "f {a} {b} {c}")
            }
            .map_err(|e| format!("write obj: {e}"))?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    // ── snapshot text ───────────────────────────────────────────────────────

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        // fold -0.0 into 0.0
        if q == 0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_vec3_line(out: &mut String, prefix: &str, v: [f64; 3]) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v[0]);
        out.push(' ');
        write_f64(out, v[1]);
        out.push(' ');
        write_f64(out, v[2]);
        out.push('\n');
    }

    fn write_front_diagnostics(out: &mut String, diag: &AdvancingFrontDiagnostics) {
        let _ = writeln!(out, "front_diag.initial_side_count {}", diag.initial_side_count);
        let _ = writeln!(out, "front_diag.iterations {}", diag.iterations);
        let _ = writeln!(out, "front_diag.peak_front_size {}", diag.peak_front_size);
        let _ = writeln!(out, "front_diag.ideal_point_count {}", diag.ideal_point_count);
        let _ = writeln!(
            out,
            "front_diag.constraint_crossing_count {}",
            diag.constraint_crossing_count
        );
        let _ = writeln!(out, "front_diag.free_node_count {}", diag.free_node_count);
        let _ = writeln!(out, "front_diag.single_neighbor_count {}", diag.single_neighbor_count);
        let _ = writeln!(out, "front_diag.close_triangle_count {}", diag.close_triangle_count);
        let _ = writeln!(out, "front_diag.boundary_split_count {}", diag.boundary_split_count);
        let _ = writeln!(out, "front_diag.hanging_node_count {}", diag.hanging_node_count);
        let _ = writeln!(out, "front_diag.warning_count {}", diag.warnings.len());
        for (idx, warning) in diag.warnings.iter().enumerate() {
            let _ = writeln!(out, "front_diag.warning.{idx} {warning}");
        }
    }

    fn write_front_snapshots(out: &mut String, snapshots: &[FrontSnapshot]) {
        let _ = writeln!(out, "front.snapshots {}", snapshots.len());
        for snap in snapshots {
            let _ = writeln!(out, "front.iteration {} sides {}", snap.iteration, snap.len());
            for side in &snap.sides {
                write_vec3_line(out, &format!("s{} a", side.id.index()), side.a.to_array());
                write_vec3_line(out, &format!("s{} b", side.id.index()), side.b.to_array());
            }
        }
    }

    fn write_geom_mesh_diagnostics(out: &mut String, diag: &GeomMeshDiagnostics) {
        let _ = writeln!(out, "mesh_diag.vertex_count {}", diag.vertex_count);
        let _ = writeln!(out, "mesh_diag.triangle_count {}", diag.triangle_count);
        let _ = writeln!(out, "mesh_diag.welded_vertex_count {}", diag.welded_vertex_count);
        let _ = writeln!(out, "mesh_diag.flipped_triangle_count {}", diag.flipped_triangle_count);
        let _ = writeln!(
            out,
            "mesh_diag.degenerate_triangle_count {}",
            diag.degenerate_triangle_count
        );
        let _ = writeln!(out, "mesh_diag.open_edge_count {}", diag.open_edge_count);
        let _ = writeln!(
            out,
            "mesh_diag.non_manifold_edge_count {}",
            diag.non_manifold_edge_count
        );
        let _ = writeln!(out, "mesh_diag.warning_count {}", diag.warnings.len());
        for (idx, warning) in diag.warnings.iter().enumerate() {
            let _ = writeln!(out, "mesh_diag.warning.{idx} {warning}");
        }
    }

    fn write_mesh(out: &mut String, mesh: &GeomMesh) {
        let _ = writeln!(out, "mesh.vertex_count {}", mesh.positions.len());
        let _ = writeln!(out, "mesh.triangle_count {}", mesh.indices.len() / 3);
        let _ = write!(out, "mesh.area ");
        write_f64(out, mesh.area());
        out.push('\n');

        let _ = writeln!(out, "mesh.positions {}", mesh.positions.len());
        for p in mesh.positions.iter().copied() {
            write_vec3_line(out, "p", p);
        }

        let _ = writeln!(out, "mesh.indices {}", mesh.indices.len());
        for tri in mesh.indices.chunks_exact(3) {
            let _ = writeln!(out, "i {} {} {}", tri[0], tri[1], tri[2]);
        }

        if let Some(normals) = mesh.normals.as_ref() {
            let _ = writeln!(out, "mesh.normals {}", normals.len());
            for n in normals.iter().copied() {
                write_vec3_line(out, "n", n);
            }
        } else {
            let _ = writeln!(out, "mesh.normals none");
        }
    }

    fn snapshot(op: &str, spacing: f64, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# afm-engine snapshot v1");
        let _ = writeln!(out, "op {op}");
        let _ = writeln!(out, "spacing {spacing}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    // ── scenarios ───────────────────────────────────────────────────────────

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        UnitSquare,
        SquareWithHole,
        NearTriangle,
        Disc,
        ConcaveNotch,
        Rectangle,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::UnitSquare,
            Scenario::SquareWithHole,
            Scenario::NearTriangle,
            Scenario::Disc,
            Scenario::ConcaveNotch,
            Scenario::Rectangle,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::UnitSquare => "unit_square",
                Scenario::SquareWithHole => "square_with_hole",
                Scenario::NearTriangle => "near_triangle",
                Scenario::Disc => "disc",
                Scenario::ConcaveNotch => "concave_notch",
                Scenario::Rectangle => "rectangle",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Self::ALL.iter().copied().find(|s| s.name() == name)
        }

        fn default_spacing(self) -> f64 {
            match self {
                Scenario::UnitSquare | Scenario::SquareWithHole | Scenario::NearTriangle => 1.0,
                Scenario::Disc | Scenario::ConcaveNotch | Scenario::Rectangle => 0.5,
            }
        }

        fn loops(self, spacing: f64) -> Vec<BoundaryLoop> {
            let p = |x: f64, y: f64| Point3::new(x, y, 0.0);
            match self {
                Scenario::UnitSquare => vec![BoundaryLoop::from_polygon(
                    &[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)],
                    spacing,
                    false,
                    Vec3::Z,
                )],
                Scenario::SquareWithHole => vec![
                    BoundaryLoop::from_polygon(
                        &[p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)],
                        spacing,
                        false,
                        Vec3::Z,
                    ),
                    BoundaryLoop::from_polygon(
                        &[p(1.5, 1.5), p(2.5, 1.5), p(2.5, 2.5), p(1.5, 2.5)],
                        spacing,
                        true,
                        Vec3::Z,
                    ),
                ],
                Scenario::NearTriangle => vec![BoundaryLoop::outer(
                    vec![p(0.0, 0.0), p(1.0, 0.0), p(0.5, 0.85), p(0.0, 0.0)],
                    Vec3::Z,
                )],
                Scenario::Disc => {
                    let radius = 2.0;
                    let ratio = TAU * radius / spacing;
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let count = if ratio.is_finite() { ratio.round().max(3.0) as usize } else { 3 };
                    #[allow(clippy::cast_precision_loss)]
                    let corners: Vec<Point3> = (0..count)
                        .map(|i| {
                            let t = TAU * i as f64 / count as f64;
                            p(radius * t.cos(), radius * t.sin())
                        })
                        .collect();
                    vec![BoundaryLoop::from_polygon(&corners, spacing, false, Vec3::Z)]
                }
                Scenario::ConcaveNotch => vec![BoundaryLoop::from_polygon(
                    &[
                        p(0.0, 0.0),
                        p(4.0, 0.0),
                        p(4.0, 3.0),
                        p(2.5, 3.0),
                        p(2.0, 1.5),
                        p(1.5, 3.0),
                        p(0.0, 3.0),
                    ],
                    spacing,
                    false,
                    Vec3::Z,
                )],
                Scenario::Rectangle => vec![BoundaryLoop::from_polygon(
                    &[p(0.0, 0.0), p(5.0, 0.0), p(5.0, 3.0), p(0.0, 3.0)],
                    spacing,
                    false,
                    Vec3::Z,
                )],
            }
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        mesh: GeomMesh,
        front_diag: AdvancingFrontDiagnostics,
        mesh_diag: GeomMeshDiagnostics,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario, settings: RunSettings) -> Result<ScenarioOutput, String> {
        let spacing = settings.spacing.unwrap_or_else(|| scenario.default_spacing());
        let loops = scenario.loops(spacing);
        let options = MeshOptions::new(spacing).with_debug(settings.debug);

        let result = mesh_boundary_loops(&loops, &options).map_err(|e| e.to_string())?;
        let (mesh, mesh_diag) = mesh_from_panels(&result.panels, Tolerance::WELD);
        let front_diag = result.diagnostics;

        let snap = snapshot(scenario.name(), spacing, |out| {
            write_front_diagnostics(out, &front_diag);
            write_geom_mesh_diagnostics(out, &mesh_diag);
            write_mesh(out, &mesh);
            if settings.debug {
                write_front_snapshots(out, &front_diag.snapshots);
            }
        });

        Ok(ScenarioOutput {
            name: scenario.name(),
            mesh,
            front_diag,
            mesh_diag,
            snapshot: snap,
        })
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

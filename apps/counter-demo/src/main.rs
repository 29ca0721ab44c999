use trellis_core::{Element, FiberRoot, Hooks, MemoryHost, Props, ReconcileError};
use trellis_runtime_std::StdRuntime;

const CONTAINER_ID: &str = "root";
const DEFAULT_BUDGET_MS: u64 = 5;
const DEFAULT_CLICKS: usize = 3;

fn counter(hooks: &mut Hooks<'_>, props: &Props) -> Element {
    let label = props
        .get("label")
        .and_then(|value| value.as_str())
        .unwrap_or("Count")
        .to_owned();
    let (count, set_count) = hooks.use_state(1u32);
    let (history, set_history) = hooks.use_state(Vec::<u32>::new());

    Element::host("div")
        .attr("class", "counter")
        .child(
            Element::host("button")
                .on("Click", move |_| {
                    set_count.update(|count| count + 1);
                    set_history.update(move |history| {
                        let mut next = history.clone();
                        next.push(count);
                        next
                    });
                })
                .child(format!("{label}: {count}")),
        )
        .child(
            Element::host("ul").children_from(
                history
                    .iter()
                    .map(|previous| Element::host("li").child(format!("was {previous}"))),
            ),
        )
}

fn app() -> Element {
    Element::host("main")
        .attr("id", "app")
        .child(Element::host("h1").child("Trellis counter"))
        .child(Element::component("Counter", counter).attr("label", "Count"))
}

fn parse_arg<T: std::str::FromStr>(arg: Option<String>, default: T) -> T {
    arg.and_then(|value| value.parse().ok()).unwrap_or(default)
}

fn pump(
    runtime: &StdRuntime,
    root: &mut FiberRoot<MemoryHost>,
    budget_ms: u64,
) -> Result<(), ReconcileError> {
    let summary = runtime.pump(root, budget_ms)?;
    log::info!(
        "ran {} slice(s), {} yielded, {} commit(s), last {:?}",
        summary.slices,
        summary.yielded,
        summary.commits,
        summary.last_commit
    );
    Ok(())
}

fn run(budget_ms: u64, clicks: usize) -> Result<String, Box<dyn std::error::Error>> {
    let runtime = StdRuntime::new();
    let mut host = MemoryHost::new();
    let container = host.create_container(CONTAINER_ID);
    let mut root = FiberRoot::with_runtime(host, runtime.runtime());

    root.render_into(app(), CONTAINER_ID)?;
    pump(&runtime, &mut root, budget_ms)?;
    let mounted = root.host_mut().take_ops().len();
    log::info!("initial mount issued {mounted} surface operation(s)");

    for click in 0..clicks {
        let label = format!("Count: {}", click + 1);
        let Some(button) = root.host().find_by_text(container, &label) else {
            return Err(format!("button {label:?} not found").into());
        };
        let handled = root.host().dispatch(button, "click")?;
        log::debug!("click {click} reached {handled} listener(s)");
        pump(&runtime, &mut root, budget_ms)?;
        let ops = root.host_mut().take_ops();
        log::info!("click {click} issued {} surface operation(s)", ops.len());
    }

    Ok(root.host().dump_tree(container))
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let budget_ms = parse_arg(args.next(), DEFAULT_BUDGET_MS);
    let clicks = parse_arg(args.next(), DEFAULT_CLICKS);

    println!("=== Trellis counter demo ===");
    println!("slice budget {budget_ms} ms, {clicks} click(s)");

    match run(budget_ms, clicks) {
        Ok(tree) => print!("{tree}"),
        Err(err) => {
            log::error!("demo failed: {err}");
            std::process::exit(1);
        }
    }
}

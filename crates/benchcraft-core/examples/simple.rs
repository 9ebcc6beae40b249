use std::sync::Arc;

use benchcraft_core::{
    from_async_fn, Benchmark, EvaluationPolicy, ExactMatchPolicy, FillInPolicy, ScoreResult, Task,
    TracingObserver, VecTaskSource, YamlDirTaskSource,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Example 1: Inline tasks
    let choice = ExactMatchPolicy::new(
        vec![
            ("a".to_string(), ScoreResult::new(100.0, "correct")),
            ("b".to_string(), ScoreResult::new(20.0, "partially correct")),
        ],
        0.0,
        "unrelated answer",
    )?;
    let capital = FillInPolicy::new(["Paris"], 100.0, 0.0, "wrong city")?;
    let tasks = vec![
        Task::new(
            "Pick A",
            "Which letter comes first? A or B. Answer with the letter only.",
            EvaluationPolicy::ExactMatch(choice),
        )
        .with_category("warmup"),
        Task::new(
            "Capital",
            "What is the capital of France? One word.",
            EvaluationPolicy::FillIn(capital),
        )
        .with_category("knowledge"),
    ];

    // Model: a canned responder standing in for a real API
    let model = from_async_fn("canned", |prompt| {
        let reply = if prompt.contains("France") { "Paris." } else { "Option A" };
        async move { Ok(reply.to_string()) }
    });

    let bench = Benchmark::builder()
        .model(model.clone())
        .tasks(Arc::new(VecTaskSource::new(tasks)))
        .observer(Arc::new(TracingObserver))
        .build()?;

    let report = bench.run().await?;
    println!("{}", report.summary_table());

    // Example 2: Load tasks from a directory if provided
    if let Some(dir) = std::env::args().nth(1) {
        let bench = Benchmark::builder()
            .model(model)
            .tasks(Arc::new(YamlDirTaskSource::new(dir)))
            .build()?;
        let report = bench.run().await?;
        println!("{}", report.summary_table());
    }

    Ok(())
}

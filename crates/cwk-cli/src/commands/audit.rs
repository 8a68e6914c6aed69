use anyhow::Result;
use cwk_catalog::Store;

/// Print one line per sibling set whose orders are not `1..=N`. Returns the
/// number of such sets.
pub async fn ordering(store: &dyn Store) -> Result<usize> {
    let violations = cwk_catalog::audit_ordering(store).await?;
    for v in &violations {
        println!("violation {v}");
    }
    println!("ordering_violations={}", violations.len());
    Ok(violations.len())
}

//! Plain-text tables for terminal output.

use accident_map_ai::annotate::severity_phrase;
use accident_map_hotspot_models::HotspotSummary;
use accident_map_source::dataset_def::DatasetDefinition;

/// Prints one row per hotspot, followed by its advisory when present.
pub fn print_hotspots(hotspots: &[HotspotSummary]) {
    if hotspots.is_empty() {
        println!("No hotspots.");
        return;
    }

    println!(
        "{:>4}  {:>6}  {:<20}  {:<12}  {:<10}  SEVERITIES",
        "#", "COUNT", "LOCATION", "WEATHER", "TIME"
    );
    println!("{}", "-".repeat(90));

    for (rank, hotspot) in hotspots.iter().enumerate() {
        println!("{}", hotspot_row(rank + 1, hotspot));
        if let Some(advisory) = &hotspot.advisory {
            println!("{:>14}{advisory}", "> ");
        }
    }
}

fn hotspot_row(rank: usize, hotspot: &HotspotSummary) -> String {
    format!(
        "{rank:>4}  {:>6}  {:<20}  {:<12}  {:<10}  {}",
        hotspot.count,
        hotspot.location().to_string(),
        hotspot.weather,
        hotspot.time,
        severity_phrase(&hotspot.severities)
    )
}

/// Prints the dataset registry.
pub fn print_datasets(datasets: &[DatasetDefinition]) {
    println!("{:<12} {:<40} LICENSE", "ID", "NAME");
    println!("{}", "-".repeat(70));
    for dataset in datasets {
        println!(
            "{:<12} {:<40} {}",
            dataset.id(),
            dataset.name(),
            dataset.license().license_type
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_shows_rank_location_and_severities() {
        let hotspot = HotspotSummary {
            latitude: 45.5,
            longitude: -73.5,
            count: 12,
            severities: [("Léger", 11), ("Grave", 1)].into_iter().collect(),
            weather: "clear".to_string(),
            time: "16:59:00".to_string(),
            advisory: None,
        };
        let row = hotspot_row(1, &hotspot);
        assert!(row.starts_with("   1      12  45.5000,-73.5000"));
        assert!(row.contains("clear"));
        assert!(row.ends_with("11 Léger, 1 Grave"));
    }
}

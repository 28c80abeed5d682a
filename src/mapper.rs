use crate::models::point::Point;
use crate::models::snapshot::{Instance, Snapshot};

pub const TOTALS_MEASUREMENT: &str = "totals";
pub const INSTANCES_MEASUREMENT: &str = "instances";

/// User-count thresholds for the cumulative `above{t}` fields.
pub const USER_THRESHOLDS: [i64; 9] = [2, 5, 10, 50, 100, 500, 1000, 5000, 10000];

pub const ALLOWED: &str = "allowed";
pub const BANNED: &str = "banned";

/// Content categories an instance can declare as prohibited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProhibitedCategory {
    NudityNocw,
    NudityAll,
    PornographyNocw,
    PornographyAll,
    Sexism,
    Racism,
    IllegalContentLinks,
    Spam,
    Advertising,
    HateSpeeches,
    Harrassment,
    SpoilersNocw,
}

impl ProhibitedCategory {
    pub const ALL: [ProhibitedCategory; 12] = [
        ProhibitedCategory::NudityNocw,
        ProhibitedCategory::NudityAll,
        ProhibitedCategory::PornographyNocw,
        ProhibitedCategory::PornographyAll,
        ProhibitedCategory::Sexism,
        ProhibitedCategory::Racism,
        ProhibitedCategory::IllegalContentLinks,
        ProhibitedCategory::Spam,
        ProhibitedCategory::Advertising,
        ProhibitedCategory::HateSpeeches,
        ProhibitedCategory::Harrassment,
        ProhibitedCategory::SpoilersNocw,
    ];

    /// Tag key on `instances` points.
    pub fn tag_key(self) -> &'static str {
        match self {
            ProhibitedCategory::NudityNocw => "nudityNocw",
            ProhibitedCategory::NudityAll => "nudityAll",
            ProhibitedCategory::PornographyNocw => "pornographyNocw",
            ProhibitedCategory::PornographyAll => "pornographyAll",
            ProhibitedCategory::Sexism => "sexism",
            ProhibitedCategory::Racism => "racism",
            ProhibitedCategory::IllegalContentLinks => "illegalContentLinks",
            ProhibitedCategory::Spam => "spam",
            ProhibitedCategory::Advertising => "advertising",
            ProhibitedCategory::HateSpeeches => "hateSpeeches",
            ProhibitedCategory::Harrassment => "harrassment",
            ProhibitedCategory::SpoilersNocw => "spoilersNocw",
        }
    }

    /// Code used by the upstream catalog and in `infos.prohibitedContent`.
    pub fn code(self) -> &'static str {
        match self {
            ProhibitedCategory::NudityNocw => "nudity_nocw",
            ProhibitedCategory::NudityAll => "nudity_all",
            ProhibitedCategory::PornographyNocw => "pornography_nocw",
            ProhibitedCategory::PornographyAll => "pornography_all",
            ProhibitedCategory::SpoilersNocw => "spoilers_nocw",
            other => other.tag_key(),
        }
    }

    /// Accepts either the upstream code or the tag key.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == name || c.tag_key() == name)
    }
}

/// Map a full snapshot: the `totals` point first, then one `instances` point
/// per instance in snapshot order. The same snapshot always maps to the same points.
pub fn map_snapshot(snapshot: &Snapshot, source_url: &str) -> Vec<Point> {
    let mut points = Vec::with_capacity(snapshot.instances.len() + 1);
    points.push(totals_point(snapshot, source_url));
    points.extend(instance_points(snapshot));
    points
}

pub fn totals_point(snapshot: &Snapshot, source_url: &str) -> Point {
    let mut point = Point::new(TOTALS_MEASUREMENT)
        .tag("scrapedFrom", source_url)
        .field("totalUsers", snapshot.total_users)
        .field("totalInstances", snapshot.total_instances())
        .field("totalStatuses", snapshot.total_statuses());

    for threshold in USER_THRESHOLDS {
        point = point.field(format!("above{threshold}"), snapshot.above_users(threshold));
    }
    point
}

pub fn instance_points(snapshot: &Snapshot) -> impl Iterator<Item = Point> + '_ {
    snapshot
        .instances
        .iter()
        .map(move |inst| instance_point(inst, snapshot.total_users, snapshot.total_instances()))
}

fn instance_point(inst: &Instance, total_users: i64, total_instances: i64) -> Point {
    let infos = &inst.infos;
    let other_prohibited = if infos.other_prohibited_content.is_empty() {
        "no"
    } else {
        "yes"
    };

    let mut point = Point::new(INSTANCES_MEASUREMENT)
        .tag("id", inst.id.as_str())
        .tag("name", inst.name.as_str())
        .tag("httpsRank", inst.https_rank.as_str())
        .tag("obsRank", inst.obs_rank.as_str())
        .tag("version", inst.version.as_str())
        .tag("up", bool_tag(inst.up))
        .tag("openRegistrations", bool_tag(inst.open_registrations))
        .tag("ipv6", bool_tag(inst.ipv6))
        .tag("dead", bool_tag(inst.dead))
        .tag("blacklisted", bool_tag(inst.blacklisted))
        .tag("optOut", bool_tag(infos.opt_out))
        .tag("noOtherLanguages", bool_tag(infos.no_other_languages))
        .tag("federation", infos.federation.as_str())
        .tag("bots", infos.bots.as_str())
        .tag("brands", infos.brands.as_str())
        .tag("otherProhibitedContent", other_prohibited);

    for category in ProhibitedCategory::ALL {
        point = point.tag(category.tag_key(), ALLOWED);
    }
    for name in &infos.prohibited_content {
        if let Some(category) = ProhibitedCategory::parse(name) {
            point = point.tag(category.tag_key(), BANNED);
        }
    }

    point
        .field("score", inst.score)
        .field("uptime", inst.uptime)
        .field("connected", inst.connected)
        .field("languages", infos.languages.len() as i64)
        .field("obsScore", inst.obs_score)
        .field("httpsScore", inst.https_score)
        .field("versionScore", inst.version_score)
        .field("usersChangeRatio", inst.users_change_ratio)
        .field("downchecks", inst.downchecks)
        .field("upchecks", inst.upchecks)
        .field("users", inst.users)
        .field("statuses", inst.statuses)
        .field("connections", inst.connections)
        .field("totalUsers", total_users)
        .field("totalInstances", total_instances)
}

fn bool_tag(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::snapshot::Infos;

    const SOURCE: &str = "https://instances.mastodon.xyz/list.json";

    fn instance(users: i64, statuses: i64, prohibited: &[&str]) -> Instance {
        Instance {
            id: format!("id-{users}"),
            name: format!("node{users}.example"),
            users,
            statuses,
            infos: Infos {
                prohibited_content: prohibited.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn snapshot(instances: Vec<Instance>) -> Snapshot {
        let total_users = instances.iter().map(|i| i.users).sum();
        Snapshot {
            instances,
            total_users,
            ..Default::default()
        }
    }

    fn category_tags(point: &Point) -> Vec<(&'static str, &str)> {
        ProhibitedCategory::ALL
            .into_iter()
            .map(|c| (c.tag_key(), point.tag_value(c.tag_key()).unwrap()))
            .collect()
    }

    #[test]
    fn test_empty_prohibited_list_allows_everything() {
        let points = map_snapshot(&snapshot(vec![instance(10, 1, &[])]), SOURCE);
        for (key, value) in category_tags(&points[1]) {
            assert_eq!(value, ALLOWED, "category {key}");
        }
    }

    #[test]
    fn test_listed_category_is_banned_others_allowed() {
        let inst = instance(10, 1, &["nudity_nocw", "hateSpeeches", "not-a-category"]);
        let points = map_snapshot(&snapshot(vec![inst]), SOURCE);

        for (key, value) in category_tags(&points[1]) {
            let expected = if key == "nudityNocw" || key == "hateSpeeches" {
                BANNED
            } else {
                ALLOWED
            };
            assert_eq!(value, expected, "category {key}");
        }
        assert!(points[1].tag_value("not-a-category").is_none());
    }

    #[test]
    fn test_ban_applies_only_to_its_instance() {
        let points = map_snapshot(
            &snapshot(vec![instance(1, 0, &["racism"]), instance(2, 0, &[])]),
            SOURCE,
        );
        assert_eq!(points[1].tag_value("racism"), Some(BANNED));
        assert_eq!(points[2].tag_value("racism"), Some(ALLOWED));
    }

    #[test]
    fn test_category_parse_accepts_code_and_tag_key() {
        assert_eq!(
            ProhibitedCategory::parse("spoilers_nocw"),
            Some(ProhibitedCategory::SpoilersNocw)
        );
        assert_eq!(
            ProhibitedCategory::parse("spoilersNocw"),
            Some(ProhibitedCategory::SpoilersNocw)
        );
        assert_eq!(ProhibitedCategory::parse("spam"), Some(ProhibitedCategory::Spam));
        assert_eq!(ProhibitedCategory::parse("Spam"), None);
    }

    #[test]
    fn test_thresholds_are_strict_and_cumulative() {
        let users = [0, 2, 3, 10, 11, 500, 501, 10000, 10001];
        let snap = snapshot(users.iter().map(|&u| instance(u, 0, &[])).collect());
        let totals = totals_point(&snap, SOURCE);

        for t in USER_THRESHOLDS {
            let expected = users.iter().filter(|&&u| u > t).count() as i64;
            assert_eq!(totals.integer(&format!("above{t}")), Some(expected), "above{t}");
        }
        assert_eq!(totals.integer("above2"), Some(7));
        assert_eq!(totals.integer("above10000"), Some(1));
    }

    #[test]
    fn test_total_statuses_matches_instance_points() {
        let snap = snapshot(vec![
            instance(5, 100, &[]),
            instance(7, 23, &[]),
            instance(9, 0, &[]),
        ]);
        let points = map_snapshot(&snap, SOURCE);

        let summed: i64 = points[1..].iter().filter_map(|p| p.integer("statuses")).sum();
        assert_eq!(points[0].integer("totalStatuses"), Some(summed));
        assert_eq!(points[0].integer("totalInstances"), Some(3));
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn test_zero_instances_still_emits_totals() {
        let points = map_snapshot(&Snapshot::default(), SOURCE);
        assert_eq!(points.len(), 1);

        let totals = &points[0];
        assert_eq!(totals.measurement, TOTALS_MEASUREMENT);
        assert_eq!(totals.integer("totalInstances"), Some(0));
        for t in USER_THRESHOLDS {
            assert_eq!(totals.integer(&format!("above{t}")), Some(0));
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let snap = snapshot(vec![instance(3, 4, &["spam"]), instance(600, 9, &[])]);
        assert_eq!(map_snapshot(&snap, SOURCE), map_snapshot(&snap, SOURCE));
    }

    #[test]
    fn test_single_large_instance_scenario() {
        let snap = snapshot(vec![instance(1500, 10, &["spam"])]);
        let points = map_snapshot(&snap, SOURCE);

        let totals = &points[0];
        assert_eq!(totals.tag_value("scrapedFrom"), Some(SOURCE));
        assert_eq!(totals.integer("above1000"), Some(1));
        assert_eq!(totals.integer("above5000"), Some(0));
        assert_eq!(totals.integer("totalStatuses"), Some(10));

        let inst = &points[1];
        assert_eq!(inst.measurement, INSTANCES_MEASUREMENT);
        for (key, value) in category_tags(inst) {
            let expected = if key == "spam" { BANNED } else { ALLOWED };
            assert_eq!(value, expected, "category {key}");
        }
    }

    #[test]
    fn test_instance_tags_and_fields() {
        let mut inst = instance(42, 7, &[]);
        inst.up = true;
        inst.uptime = 0.75;
        inst.infos.languages = vec!["en".into(), "de".into()];
        inst.infos.other_prohibited_content = vec![serde_json::json!("crypto scams")];

        let snap = Snapshot {
            instances: vec![inst, instance(1, 1, &[])],
            total_users: 1000,
            ..Default::default()
        };
        let points = map_snapshot(&snap, SOURCE);
        let p = &points[1];

        assert_eq!(p.tag_value("up"), Some("true"));
        assert_eq!(p.tag_value("dead"), Some("false"));
        assert_eq!(p.tag_value("otherProhibitedContent"), Some("yes"));
        assert_eq!(points[2].tag_value("otherProhibitedContent"), Some("no"));
        assert_eq!(p.integer("languages"), Some(2));
        assert_eq!(p.integer("totalUsers"), Some(1000));
        assert_eq!(p.integer("totalInstances"), Some(2));
        assert_eq!(p.float("uptime"), Some(0.75));
        assert_eq!(p.integer("users"), Some(42));
    }
}

// src/sql/election.rs

use super::{Staging, DATA_CSV};
use crate::election::Election;

const POLL_TABLE: Staging<'static> = Staging {
    temp: "tmp_ed",
    dest: "election_data",
    columns: &[
        "election_id",
        "region_id",
        "ed_id",
        "va_id",
        "category",
        "candidate",
        "party",
        "votes",
        "merged_id",
    ],
    csv: DATA_CSV,
};

/// Parties kept by name; every other affiliation becomes `Other`.
const PARTY_RENAMES: &[(&str, &str)] = &[
    ("NDP-New Democratic Party", "NDP"),
    ("Green Party", "Green"),
    ("Bloc Québécois", "Bloc"),
];
const MAIN_PARTIES: &[&str] = &["Conservative", "Liberal", "NDP", "Green", "Bloc"];

/// `import.sql` for poll-by-poll results of `election`.
pub fn election_script(election: Election) -> String {
    let id = election.id();
    let mut sql = String::new();

    sql.push_str(&POLL_TABLE.create());
    sql.push_str(&POLL_TABLE.copy());
    sql.push('\n');

    for (from, to) in PARTY_RENAMES {
        sql.push_str(&format!(
            "update tmp_ed set party = '{to}' where party = '{from}';\n"
        ));
    }
    let kept = MAIN_PARTIES
        .iter()
        .map(|p| format!("'{p}'"))
        .collect::<Vec<_>>()
        .join(", ");
    sql.push_str(&format!(
        "update tmp_ed set party = 'Other', candidate = null where not party in ({kept});\n"
    ));

    if election.keeps_merged_polls() {
        // reloads replace the whole election
        sql.push_str(&format!(
            "delete from election_data where election_id = '{id}';\n"
        ));
    } else {
        sql.push_str("delete from tmp_ed where merged_id is not null;\n");
    }

    sql.push_str(
        r#"
-- some polls may have multiple rows
insert into election_data (election_id, region_id, ed_id, va_id, candidate, party, votes, merged_id)
select election_id, region_id, ed_id, va_id, candidate, party, sum(votes), merged_id
from tmp_ed
group by election_id, region_id, ed_id, va_id, candidate, party, merged_id
on conflict do nothing;
"#,
    );

    sql.push_str(&format!(
        r#"
-- share of the poll's votes for each candidate
with x as (
    select election_id, ed_id, va_id, sum(votes) as total
    from election_data
    where election_id = '{id}'
    group by election_id, ed_id, va_id
)
update election_data ed
set pct = votes::numeric / total
from x
where ed.election_id = x.election_id and ed.ed_id = x.ed_id and ed.va_id = x.va_id
and total > 0;
"#
    ));

    if election.keeps_merged_polls() {
        sql.push_str(&format!(
            r#"
-- winning margin: the leader's share minus the runner-up's,
-- everyone else's share minus the leader's
with ranked as (
    select election_id, ed_id, va_id, party, candidate, pct,
        row_number() over w as pos,
        lead(pct) over w as runner_up,
        first_value(pct) over w as leader
    from election_data
    where election_id = '{id}' and merged_id is null and pct is not null
    window w as (partition by election_id, ed_id, va_id order by pct desc)
)
update election_data ed
set margin = case when r.pos = 1 then r.pct - coalesce(r.runner_up, 0) else r.pct - r.leader end
from ranked r
where ed.election_id = r.election_id and ed.ed_id = r.ed_id and ed.va_id = r.va_id
and ed.party = r.party and ed.candidate is not distinct from r.candidate;

-- merged polls report the results of the poll they were merged into
update election_data ed
set pct = src.pct, margin = src.margin
from election_data src
where ed.election_id = '{id}' and ed.merged_id is not null
and src.election_id = ed.election_id and src.ed_id = ed.ed_id and src.va_id = ed.merged_id
and src.party = ed.party and src.candidate is not distinct from ed.candidate
and src.pct > 0;
"#
        ));
    }

    sql
}

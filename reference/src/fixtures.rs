//! Small in-memory reference tables shared by tests across the workspace.

use samgen_core::TableKind;

use crate::{columns, ReferenceData, Row};

/// Normalized products covered by the fixture discovery table, in table order.
pub const PRODUCTS: [&str; 3] = [
    "AutoCAD Architecture",
    "ArcGIS 3D Analyst",
    "Advanced Meshing",
];

/// Builds a loaded repository with every table populated.
#[must_use]
pub fn reference_data() -> ReferenceData {
    ReferenceData::from_tables([
        (TableKind::Discovery, discovery_rows()),
        (TableKind::User, user_rows()),
        (
            TableKind::Group,
            vec![
                Row::new(
                    TableKind::Group,
                    [(columns::GROUP, "Engineering"), (columns::GROUP_SYS_ID, "g-eng")],
                ),
                Row::new(
                    TableKind::Group,
                    [(columns::GROUP, "Design"), (columns::GROUP_SYS_ID, "g-design")],
                ),
            ],
        ),
        (
            TableKind::LicenseServer,
            vec![Row::new(
                TableKind::LicenseServer,
                [
                    (columns::LICENSE_SERVER, "27000@flex01"),
                    (columns::LICENSE_SERVER_SYS_ID, "ls-1"),
                ],
            )],
        ),
        (
            TableKind::LicenseType,
            vec![Row::new(
                TableKind::LicenseType,
                [
                    (columns::LICENSE_TYPE, "Concurrent"),
                    (columns::LICENSE_TYPE_SYS_ID, "lt-1"),
                ],
            )],
        ),
    ])
}

fn discovery_rows() -> Vec<Row> {
    [
        ("Autodesk", "2020.0"),
        ("Esri", "10.8"),
        ("Ansys", "2021"),
    ]
    .iter()
    .zip(PRODUCTS)
    .enumerate()
    .map(|(index, ((publisher, version), product))| {
        let n = index + 1;
        Row::new(
            TableKind::Discovery,
            [
                (columns::DISCOVERY_MODEL, format!("{product} {version}")),
                (columns::DISCOVERY_SYS_ID, format!("dm-{n}")),
                (columns::NORM_PRODUCT, product.to_owned()),
                (columns::NORM_PRODUCT_SYS_ID, format!("np-{n}")),
                (columns::NORM_PUBLISHER, (*publisher).to_owned()),
                (columns::NORM_PUBLISHER_SYS_ID, format!("pub-{n}")),
                (columns::PRODUCT, product.to_owned()),
                (columns::PUBLISHER, (*publisher).to_owned()),
                (columns::VERSION, (*version).to_owned()),
                (columns::SOFTWARE_INSTALL, format!("{product} install")),
                (columns::SOFTWARE_INSTALL_SYS_ID, format!("si-{n}")),
                (columns::LICENSE_SYS_ID, format!("lic-{n}")),
            ],
        )
    })
    .collect()
}

fn user_rows() -> Vec<Row> {
    ["alice", "bob", "carol"]
        .iter()
        .map(|user| {
            Row::new(
                TableKind::User,
                [
                    (columns::USER, (*user).to_owned()),
                    (columns::USER_SYS_ID, format!("u-{user}")),
                    (columns::COMPUTER_NAME, format!("{user}-pc")),
                    (columns::COMPUTER_SYS_ID, format!("c-{user}")),
                    (columns::WORKSTATION, format!("{user}-ws")),
                    (columns::WORKSTATION_SYS_ID, format!("w-{user}")),
                ],
            )
        })
        .collect()
}

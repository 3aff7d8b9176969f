//! Builtin record type tables, one per numbering space.
//!
//! The tables drive registry classification; the constant modules give
//! extractors symbolic names for the codes they match on.

use super::registry::{RecordFamily, RecordKind, Registry};

/// PowerPoint document stream record codes.
pub mod presentation {
    pub const DOCUMENT: u16 = 1000;
    pub const DOCUMENT_ATOM: u16 = 1001;
    pub const END_DOCUMENT: u16 = 1002;
    pub const SLIDE: u16 = 1006;
    pub const SLIDE_ATOM: u16 = 1007;
    pub const NOTES: u16 = 1008;
    pub const NOTES_ATOM: u16 = 1009;
    pub const ENVIRONMENT: u16 = 1010;
    pub const SLIDE_PERSIST_ATOM: u16 = 1011;
    pub const MAIN_MASTER: u16 = 1016;
    pub const EX_OBJ_LIST: u16 = 1033;
    pub const EX_OBJ_LIST_ATOM: u16 = 1034;
    pub const PP_DRAWING_GROUP: u16 = 1035;
    pub const PP_DRAWING: u16 = 1036;
    pub const FONT_COLLECTION: u16 = 2005;
    pub const COLOR_SCHEME_ATOM: u16 = 2032;
    pub const TEXT_HEADER_ATOM: u16 = 3999;
    pub const TEXT_CHARS_ATOM: u16 = 4000;
    pub const STYLE_TEXT_PROP_ATOM: u16 = 4001;
    pub const TEXT_BYTES_ATOM: u16 = 4008;
    pub const TEXT_SPEC_INFO_ATOM: u16 = 4010;
    pub const FONT_ENTITY_ATOM: u16 = 4023;
    pub const CSTRING: u16 = 4026;
    pub const HEADERS_FOOTERS: u16 = 4057;
    pub const HEADERS_FOOTERS_ATOM: u16 = 4058;
    pub const SLIDE_LIST_WITH_TEXT: u16 = 4080;
    pub const USER_EDIT_ATOM: u16 = 4085;
    pub const CURRENT_USER_ATOM: u16 = 4086;
    pub const PERSIST_PTR_FULL_BLOCK: u16 = 6001;
    pub const PERSIST_PTR_INCREMENTAL_BLOCK: u16 = 6002;
}

/// Office Drawing (Escher) record codes.
pub mod drawing {
    pub const DGG_CONTAINER: u16 = 0xF000;
    pub const BSTORE_CONTAINER: u16 = 0xF001;
    pub const DG_CONTAINER: u16 = 0xF002;
    pub const SPGR_CONTAINER: u16 = 0xF003;
    pub const SP_CONTAINER: u16 = 0xF004;
    pub const SOLVER_CONTAINER: u16 = 0xF005;
    pub const DGG: u16 = 0xF006;
    pub const BSE: u16 = 0xF007;
    pub const DG: u16 = 0xF008;
    pub const SPGR: u16 = 0xF009;
    pub const SP: u16 = 0xF00A;
    pub const OPT: u16 = 0xF00B;
    pub const TEXTBOX: u16 = 0xF00C;
    pub const CLIENT_TEXTBOX: u16 = 0xF00D;
    pub const CHILD_ANCHOR: u16 = 0xF00F;
    pub const CLIENT_ANCHOR: u16 = 0xF010;
    pub const CLIENT_DATA: u16 = 0xF011;
    pub const CONNECTOR_RULE: u16 = 0xF012;
    pub const ALIGN_RULE: u16 = 0xF013;
    pub const ARC_RULE: u16 = 0xF014;
    pub const CLIENT_RULE: u16 = 0xF015;
    pub const CALLOUT_RULE: u16 = 0xF017;
    pub const BLIP_EMF: u16 = 0xF01A;
    pub const BLIP_WMF: u16 = 0xF01B;
    pub const BLIP_PICT: u16 = 0xF01C;
    pub const BLIP_JPEG: u16 = 0xF01D;
    pub const BLIP_PNG: u16 = 0xF01E;
    pub const BLIP_DIB: u16 = 0xF01F;
    pub const BLIP_TIFF: u16 = 0xF029;
    pub const COLOR_MRU: u16 = 0xF11A;
    pub const SPLIT_MENU_COLORS: u16 = 0xF11E;
    pub const SECONDARY_OPT: u16 = 0xF121;
    pub const TERTIARY_OPT: u16 = 0xF122;
}

/// Workbook BIFF record codes.
pub mod biff {
    pub const FORMULA: u16 = 0x0006;
    pub const EOF: u16 = 0x000A;
    pub const DATE_MODE: u16 = 0x0022;
    pub const FONT: u16 = 0x0031;
    pub const CONTINUE: u16 = 0x003C;
    pub const WINDOW1: u16 = 0x003D;
    pub const CODEPAGE: u16 = 0x0042;
    pub const DEF_COL_WIDTH: u16 = 0x0055;
    pub const BOUND_SHEET: u16 = 0x0085;
    pub const MUL_RK: u16 = 0x00BD;
    pub const MUL_BLANK: u16 = 0x00BE;
    pub const XF: u16 = 0x00E0;
    pub const SST: u16 = 0x00FC;
    pub const LABEL_SST: u16 = 0x00FD;
    pub const DIMENSION: u16 = 0x0200;
    pub const BLANK: u16 = 0x0201;
    pub const NUMBER: u16 = 0x0203;
    pub const LABEL: u16 = 0x0204;
    pub const BOOL_ERR: u16 = 0x0205;
    pub const STRING: u16 = 0x0207;
    pub const ROW: u16 = 0x0208;
    pub const INDEX: u16 = 0x020B;
    pub const RK: u16 = 0x027E;
    pub const FORMAT: u16 = 0x041E;
    pub const BOF: u16 = 0x0809;
}

/// Embedded chart BIFF record codes.
pub mod chart {
    pub const UNITS: u16 = 0x1001;
    pub const CHART: u16 = 0x1002;
    pub const SERIES: u16 = 0x1003;
    pub const DATA_FORMAT: u16 = 0x1006;
    pub const SERIES_TEXT: u16 = 0x100D;
    pub const LEGEND: u16 = 0x1015;
    pub const TEXT: u16 = 0x1025;
    pub const FONT_X: u16 = 0x1026;
    pub const OBJECT_LINK: u16 = 0x1027;
    pub const BEGIN: u16 = 0x1033;
    pub const END: u16 = 0x1034;
    pub const AXIS_PARENT: u16 = 0x1041;
    pub const PLOT_AREA: u16 = 0x1044;
    pub const BRAI: u16 = 0x1051;
}

const PRESENTATION_TABLE: &[(u16, RecordKind, &str)] = &[
    (presentation::DOCUMENT, RecordKind::Container, "Document"),
    (presentation::DOCUMENT_ATOM, RecordKind::Atom, "DocumentAtom"),
    (presentation::END_DOCUMENT, RecordKind::Atom, "EndDocument"),
    (presentation::SLIDE, RecordKind::Container, "Slide"),
    (presentation::SLIDE_ATOM, RecordKind::Atom, "SlideAtom"),
    (presentation::NOTES, RecordKind::Container, "Notes"),
    (presentation::NOTES_ATOM, RecordKind::Atom, "NotesAtom"),
    (presentation::ENVIRONMENT, RecordKind::Container, "Environment"),
    (
        presentation::SLIDE_PERSIST_ATOM,
        RecordKind::Atom,
        "SlidePersistAtom",
    ),
    (presentation::MAIN_MASTER, RecordKind::Container, "MainMaster"),
    (presentation::EX_OBJ_LIST, RecordKind::Container, "ExObjList"),
    (presentation::EX_OBJ_LIST_ATOM, RecordKind::Atom, "ExObjListAtom"),
    // PPDrawing and PPDrawingGroup hold Office Drawing data; their
    // payloads are reparsed under the Drawing family, so they stay atoms
    // in this numbering space.
    (presentation::PP_DRAWING_GROUP, RecordKind::Atom, "PPDrawingGroup"),
    (presentation::PP_DRAWING, RecordKind::Atom, "PPDrawing"),
    (
        presentation::FONT_COLLECTION,
        RecordKind::Container,
        "FontCollection",
    ),
    (
        presentation::COLOR_SCHEME_ATOM,
        RecordKind::Atom,
        "ColorSchemeAtom",
    ),
    (presentation::TEXT_HEADER_ATOM, RecordKind::Atom, "TextHeaderAtom"),
    (presentation::TEXT_CHARS_ATOM, RecordKind::Atom, "TextCharsAtom"),
    (
        presentation::STYLE_TEXT_PROP_ATOM,
        RecordKind::Atom,
        "StyleTextPropAtom",
    ),
    (presentation::TEXT_BYTES_ATOM, RecordKind::Atom, "TextBytesAtom"),
    (
        presentation::TEXT_SPEC_INFO_ATOM,
        RecordKind::Atom,
        "TextSpecInfoAtom",
    ),
    (presentation::FONT_ENTITY_ATOM, RecordKind::Atom, "FontEntityAtom"),
    (presentation::CSTRING, RecordKind::Atom, "CString"),
    (
        presentation::HEADERS_FOOTERS,
        RecordKind::Container,
        "HeadersFooters",
    ),
    (
        presentation::HEADERS_FOOTERS_ATOM,
        RecordKind::Atom,
        "HeadersFootersAtom",
    ),
    (
        presentation::SLIDE_LIST_WITH_TEXT,
        RecordKind::Container,
        "SlideListWithText",
    ),
    (presentation::USER_EDIT_ATOM, RecordKind::Atom, "UserEditAtom"),
    (presentation::CURRENT_USER_ATOM, RecordKind::Atom, "CurrentUserAtom"),
    (
        presentation::PERSIST_PTR_FULL_BLOCK,
        RecordKind::Atom,
        "PersistPtrFullBlock",
    ),
    (
        presentation::PERSIST_PTR_INCREMENTAL_BLOCK,
        RecordKind::Atom,
        "PersistPtrIncrementalBlock",
    ),
];

const DRAWING_TABLE: &[(u16, RecordKind, &str)] = &[
    (drawing::DGG_CONTAINER, RecordKind::Container, "DggContainer"),
    (drawing::BSTORE_CONTAINER, RecordKind::Container, "BStoreContainer"),
    (drawing::DG_CONTAINER, RecordKind::Container, "DgContainer"),
    (drawing::SPGR_CONTAINER, RecordKind::Container, "SpgrContainer"),
    (drawing::SP_CONTAINER, RecordKind::Container, "SpContainer"),
    (drawing::SOLVER_CONTAINER, RecordKind::Container, "SolverContainer"),
    (drawing::DGG, RecordKind::Atom, "Dgg"),
    (drawing::BSE, RecordKind::Atom, "BSE"),
    (drawing::DG, RecordKind::Atom, "Dg"),
    (drawing::SPGR, RecordKind::Atom, "Spgr"),
    (drawing::SP, RecordKind::Atom, "Sp"),
    (drawing::OPT, RecordKind::Atom, "Opt"),
    (drawing::TEXTBOX, RecordKind::Atom, "Textbox"),
    // ClientTextbox payloads are host records (Presentation family), so
    // the drawing walk must not descend into them.
    (drawing::CLIENT_TEXTBOX, RecordKind::Atom, "ClientTextbox"),
    (drawing::CHILD_ANCHOR, RecordKind::Atom, "ChildAnchor"),
    (drawing::CLIENT_ANCHOR, RecordKind::Atom, "ClientAnchor"),
    (drawing::CLIENT_DATA, RecordKind::Atom, "ClientData"),
    (drawing::CONNECTOR_RULE, RecordKind::Atom, "ConnectorRule"),
    (drawing::ALIGN_RULE, RecordKind::Atom, "AlignRule"),
    (drawing::ARC_RULE, RecordKind::Atom, "ArcRule"),
    (drawing::CLIENT_RULE, RecordKind::Atom, "ClientRule"),
    (drawing::CALLOUT_RULE, RecordKind::Atom, "CalloutRule"),
    (drawing::BLIP_EMF, RecordKind::Atom, "BlipEmf"),
    (drawing::BLIP_WMF, RecordKind::Atom, "BlipWmf"),
    (drawing::BLIP_PICT, RecordKind::Atom, "BlipPict"),
    (drawing::BLIP_JPEG, RecordKind::Atom, "BlipJpeg"),
    (drawing::BLIP_PNG, RecordKind::Atom, "BlipPng"),
    (drawing::BLIP_DIB, RecordKind::Atom, "BlipDib"),
    (drawing::BLIP_TIFF, RecordKind::Atom, "BlipTiff"),
    (drawing::COLOR_MRU, RecordKind::Atom, "ColorMRU"),
    (drawing::SPLIT_MENU_COLORS, RecordKind::Atom, "SplitMenuColors"),
    (drawing::SECONDARY_OPT, RecordKind::Atom, "SecondaryOpt"),
    (drawing::TERTIARY_OPT, RecordKind::Atom, "TertiaryOpt"),
];

// BIFF streams are flat; substream structure comes from BOF/EOF
// bracketing, so every code is an atom.
const BIFF_TABLE: &[(u16, RecordKind, &str)] = &[
    (biff::FORMULA, RecordKind::Atom, "Formula"),
    (biff::EOF, RecordKind::Atom, "EOF"),
    (biff::DATE_MODE, RecordKind::Atom, "Date1904"),
    (biff::FONT, RecordKind::Atom, "Font"),
    (biff::CONTINUE, RecordKind::Atom, "Continue"),
    (biff::WINDOW1, RecordKind::Atom, "Window1"),
    (biff::CODEPAGE, RecordKind::Atom, "CodePage"),
    (biff::DEF_COL_WIDTH, RecordKind::Atom, "DefColWidth"),
    (biff::BOUND_SHEET, RecordKind::Atom, "BoundSheet8"),
    (biff::MUL_RK, RecordKind::Atom, "MulRk"),
    (biff::MUL_BLANK, RecordKind::Atom, "MulBlank"),
    (biff::XF, RecordKind::Atom, "XF"),
    (biff::SST, RecordKind::Atom, "SST"),
    (biff::LABEL_SST, RecordKind::Atom, "LabelSst"),
    (biff::DIMENSION, RecordKind::Atom, "Dimension"),
    (biff::BLANK, RecordKind::Atom, "Blank"),
    (biff::NUMBER, RecordKind::Atom, "Number"),
    (biff::LABEL, RecordKind::Atom, "Label"),
    (biff::BOOL_ERR, RecordKind::Atom, "BoolErr"),
    (biff::STRING, RecordKind::Atom, "String"),
    (biff::ROW, RecordKind::Atom, "Row"),
    (biff::INDEX, RecordKind::Atom, "Index"),
    (biff::RK, RecordKind::Atom, "RK"),
    (biff::FORMAT, RecordKind::Atom, "Format"),
    (biff::BOF, RecordKind::Atom, "BOF"),
];

// Chart records nest through Begin/End markers rather than header
// version bits; the chart extractor tracks that depth itself.
const CHART_TABLE: &[(u16, RecordKind, &str)] = &[
    (chart::UNITS, RecordKind::Atom, "Units"),
    (chart::CHART, RecordKind::Atom, "Chart"),
    (chart::SERIES, RecordKind::Atom, "Series"),
    (chart::DATA_FORMAT, RecordKind::Atom, "DataFormat"),
    (chart::SERIES_TEXT, RecordKind::Atom, "SeriesText"),
    (chart::LEGEND, RecordKind::Atom, "Legend"),
    (chart::TEXT, RecordKind::Atom, "Text"),
    (chart::FONT_X, RecordKind::Atom, "FontX"),
    (chart::OBJECT_LINK, RecordKind::Atom, "ObjectLink"),
    (chart::BEGIN, RecordKind::Atom, "Begin"),
    (chart::END, RecordKind::Atom, "End"),
    (chart::AXIS_PARENT, RecordKind::Atom, "AxisParent"),
    (chart::PLOT_AREA, RecordKind::Atom, "PlotArea"),
    (chart::BRAI, RecordKind::Atom, "BRAI"),
];

pub(super) fn register_presentation(registry: &mut Registry) {
    for &(code, kind, name) in PRESENTATION_TABLE {
        registry.register(RecordFamily::Presentation, code, kind, name);
    }
}

pub(super) fn register_drawing(registry: &mut Registry) {
    for &(code, kind, name) in DRAWING_TABLE {
        registry.register(RecordFamily::Drawing, code, kind, name);
    }
}

pub(super) fn register_biff(registry: &mut Registry) {
    for &(code, kind, name) in BIFF_TABLE {
        registry.register(RecordFamily::Biff, code, kind, name);
    }
}

pub(super) fn register_chart(registry: &mut Registry) {
    for &(code, kind, name) in CHART_TABLE {
        registry.register(RecordFamily::Chart, code, kind, name);
    }
}

#[cfg(test)]
mod tests {
    use super::super::registry::registry;
    use super::*;

    #[test]
    fn test_builtin_tables_are_registered() {
        let registry = registry();
        assert_eq!(
            registry.classify(RecordFamily::Presentation, presentation::SLIDE),
            RecordKind::Container
        );
        assert_eq!(
            registry.classify(RecordFamily::Drawing, drawing::SP),
            RecordKind::Atom
        );
        assert_eq!(
            registry.classify(RecordFamily::Biff, biff::BOF),
            RecordKind::Atom
        );
        assert_eq!(
            registry.classify(RecordFamily::Chart, chart::SERIES_TEXT),
            RecordKind::Atom
        );
    }

    #[test]
    fn test_client_textbox_is_not_a_container() {
        // Its payload belongs to the host application's numbering space
        assert_eq!(
            registry().classify(RecordFamily::Drawing, drawing::CLIENT_TEXTBOX),
            RecordKind::Atom
        );
    }
}

use neuroml_widgets::model::XmlComponent;
use neuroml_widgets::projector::{ProjectionOptions, Projector};
use neuroml_widgets::visual::VisualNode;
use pretty_assertions::assert_eq;

const NET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<neuroml xmlns="http://www.neuroml.org/schema/neuroml2"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://www.neuroml.org/schema/neuroml2 NeuroML_v2.3.xsd"
         id="net_doc">
    <expTwoSynapse id="syn1" gbase="0.5nS" erev="0mV" tauDecay="5ms" tauRise="0.5ms"/>
    <expTwoSynapse id="syn2" gbase="1nS" erev="0mV" tauDecay="5ms" tauRise="0.5ms"/>
    <ionChannelHH id="na" conductance="10pS" species="na">
        <gateHHrates id="m" instances="3">
            <forwardRate type="HHExpLinearRate" rate="1per_ms" midpoint="-40mV" scale="10mV"/>
        </gateHHrates>
    </ionChannelHH>
    <network id="net1">
        <population id="pop0" component="cell" size="1"/>
    </network>
</neuroml>"#;

fn doc() -> XmlComponent {
    XmlComponent::parse(NET).unwrap()
}

#[test]
fn outline_of_a_network_document() {
    let tree = Projector::new(ProjectionOptions::new(10)).project(&doc()).unwrap();
    assert_eq!(
        tree.outline(),
        "\
+ NeuroMLDocument: net_doc
  + ExpTwoSynapse: syn1
    - gbase: 0.5nS
    - erev: 0mV
    - tauDecay: 5ms
    - tauRise: 0.5ms
  + ExpTwoSynapse: syn2
    - gbase: 1nS
    - erev: 0mV
    - tauDecay: 5ms
    - tauRise: 0.5ms
  + IonChannelHH: na
    - conductance: 10pS
    - species: na
    + GateHHrates: m
      - instances: 3
      + ForwardRate
        - type: HHExpLinearRate
        - rate: 1per\\_ms
        - midpoint: -40mV
        - scale: 10mV
  + Network: net1
    + Population: pop0
      - component: cell
      - size: 1
"
    );
}

#[test]
fn synapses_get_their_own_tab() {
    let options = ProjectionOptions::new(10).with_tabbed_types(["ExpTwoSynapse"]);
    let tree = Projector::new(options).project(&doc()).unwrap();

    let [VisualNode::TabGroup { tabs }] = tree.children() else {
        panic!("expected a single tab group, got {tree:?}");
    };
    let titles: Vec<&str> = tabs.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["ExpTwoSynapse (2)", "Other (2)"]);
    assert_eq!(tabs[1].children[0].title(), Some("IonChannelHH: na"));
    assert_eq!(tabs[1].children[1].title(), Some("Network: net1"));
}

#[test]
fn truncates_repeated_elements() {
    let tree = Projector::new(ProjectionOptions::new(1)).project(&doc()).unwrap();
    assert_eq!(
        tree.children()[0].bullets(),
        vec!["expTwoSynapse: 2 members (showing 1)"]
    );
    assert_eq!(tree.children()[1].title(), Some("ExpTwoSynapse: syn1"));
}

#[test]
fn html_output_nests_sections() {
    let tree = Projector::new(ProjectionOptions::new(10).with_max_depth(1))
        .project(&doc())
        .unwrap();
    let html = tree.to_html();
    assert!(html.starts_with(
        "<details class=\"nml-section\"><summary>NeuroMLDocument: net_doc</summary>"
    ));
    assert!(html.contains("<li>gbase: 0.5nS</li>"));
    // depth 2 and below are cut
    assert!(!html.contains("GateHHrates"));
    assert!(!html.contains("Population"));
    assert!(!html.contains("Network"));
}
